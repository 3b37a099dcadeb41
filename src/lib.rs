//! heroku-command: command dispatcher for the heroku client
//!
//! Architecture:
//! - `dispatch`: command string parsing, handler lookup, invocation, failure reporting
//! - `namespace`: handler trait and the namespace registration table
//! - `error`: failure taxonomy and remote error message extraction
//! - `config`: layered settings
//! - `cli`: argument definitions and terminal output

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod exitcode;
pub mod namespace;
pub mod util;

pub use dispatch::{CommandRoute, Dispatcher};
pub use error::{CommandError, CommandResult, RemoteError};
pub use namespace::{Handler, HandlerFactory, NamespaceRegistry, NamespaceSource};
