//! Core of the MarkFlow exam-marking client.
//!
//! Everything here is UI-agnostic and runs natively: status classification,
//! the polling state machines, pagination and sorting, endpoint contracts and
//! the token-refreshing [`ApiClient`]. The browser frontend and the `mf-cli`
//! binary bind these to `gloo`/`yew` and `reqwest`/`tokio` respectively.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod pagination;
pub mod polling;
pub mod session;
pub mod status;
pub mod table;
pub mod transport;

pub use client::{api_root, ApiClient};
pub use endpoints::{decode, Ack, Endpoint, PageRequest, ResponseShape};
pub use error::ApiError;
pub use pagination::{PageInfo, Paginated, PagerControls};
pub use polling::{BoundedPoll, PollController, PollProfile, PollTransition, RequestSequence};
pub use session::{MemoryTokenStore, TokenStore};
pub use status::{classify, HasStatus, ResourceStatus, StatusClass, StatusTone};
pub use table::{RowSelection, SortDirection, SortState, SortValue};
pub use transport::{ApiRequest, ApiResponse, FilePart, Method, MultipartForm, RequestBody, Transport};
