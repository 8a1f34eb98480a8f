// Reusable components live here.

pub mod data_table;
pub mod error_banner;
pub mod header;
pub mod loading_spinner;
pub mod pagination;
pub mod status_badge;
