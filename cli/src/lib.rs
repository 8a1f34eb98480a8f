//! `mf-cli`: a terminal client for the MarkFlow marking API.
//!
//! The binary is a thin `clap` front end over this library, which plugs a
//! `reqwest` transport and a JSON session file into the shared
//! [`markflow_shared::ApiClient`].

pub mod cli;
pub mod commands;
pub mod output;
pub mod session_file;
pub mod transport;
pub mod watch;

use markflow_shared::ApiClient;

/// API client as the CLI wires it.
pub type CliClient = ApiClient<transport::ReqwestTransport, session_file::FileTokenStore>;
