//! Command errors and their user-facing messages
//!
//! Every failure that reaches the dispatcher is a `CommandError`. The
//! classified variants map to exactly one display line; anything else
//! (`Config`, `Internal`, `Output`) is returned to the caller untouched.

use std::borrow::Cow;
use std::sync::OnceLock;

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use thiserror::Error;

pub const INVALID_COMMAND_MESSAGE: &str =
    "Unknown command. Run 'heroku help' for usage information.";
pub const UNAUTHORIZED_MESSAGE: &str = "Authentication failure";
pub const NOT_FOUND_MESSAGE: &str = "Resource not found";
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal server error";
pub const REQUEST_TIMEOUT_MESSAGE: &str =
    "API request timed out. Please try again, or contact feedback@heroku.com if this issue persists.";

/// Failure classes reported by the remote service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("resource not found")]
    NotFound { body: Option<String> },

    #[error("request failed with status {status}")]
    RequestFailed { status: u16, body: Option<String> },

    #[error("request timed out")]
    RequestTimeout,
}

impl RemoteError {
    /// Classify an HTTP response. Returns `None` for non-error statuses.
    pub fn from_status(status: u16, body: Option<String>) -> Option<Self> {
        match status {
            401 => Some(Self::Unauthorized),
            404 => Some(Self::NotFound { body }),
            408 => Some(Self::RequestTimeout),
            s if s >= 400 => Some(Self::RequestFailed { status: s, body }),
            _ => None,
        }
    }

    /// The single line shown to the user for this failure.
    pub fn display_message(&self) -> String {
        match self {
            Self::Unauthorized => UNAUTHORIZED_MESSAGE.to_string(),
            Self::NotFound { body } => extract_not_found(body.as_deref().unwrap_or("")).into_owned(),
            Self::RequestFailed { body, .. } => extract_error(body.as_deref().unwrap_or("")),
            Self::RequestTimeout => REQUEST_TIMEOUT_MESSAGE.to_string(),
        }
    }
}

/// Errors raised while routing or running a command.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("invalid command")]
    InvalidCommand,

    #[error("{0}")]
    CommandFailed(String),

    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("{context}")]
    Internal {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("cannot write output: {0}")]
    Output(#[source] std::io::Error),
}

/// Result type for dispatcher and handler operations.
pub type CommandResult<T> = Result<T, CommandError>;

impl CommandError {
    /// Message for classified failures, `None` for failures the
    /// dispatcher does not report itself.
    pub fn display_message(&self) -> Option<String> {
        match self {
            CommandError::InvalidCommand => Some(INVALID_COMMAND_MESSAGE.to_string()),
            CommandError::CommandFailed(msg) => Some(msg.clone()),
            CommandError::Remote(e) => Some(e.display_message()),
            CommandError::Config { .. }
            | CommandError::Internal { .. }
            | CommandError::Output(_) => None,
        }
    }

    /// Get the appropriate exit code for this error.
    ///
    /// `Dispatcher::run` reports classified failures itself, so the binary
    /// only exits with the `Config`, `Internal` and `Output` codes. The
    /// classified codes apply to callers of `parse_and_invoke`.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::InvalidCommand => crate::exitcode::USAGE,
            CommandError::CommandFailed(_) => crate::exitcode::SOFTWARE,
            CommandError::Remote(e) => match e {
                RemoteError::Unauthorized => crate::exitcode::NOPERM,
                RemoteError::NotFound { .. } => crate::exitcode::NOINPUT,
                RemoteError::RequestFailed { .. } | RemoteError::RequestTimeout => {
                    crate::exitcode::UNAVAILABLE
                }
            },
            CommandError::Config { .. } => crate::exitcode::CONFIG,
            CommandError::Internal { .. } => crate::exitcode::SOFTWARE,
            CommandError::Output(_) => crate::exitcode::IOERR,
        }
    }

    /// Wrap an arbitrary error with context.
    pub fn internal(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Internal {
            context: context.into(),
            source: source.into(),
        }
    }
}

fn not_found_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // ASCII word characters only
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_]+ not found$").expect("valid not-found pattern")
    })
}

/// Keep a `"<word> not found"` body as is, anything else becomes the generic text.
pub fn extract_not_found(body: &str) -> Cow<'_, str> {
    if not_found_pattern().is_match(body) {
        Cow::Borrowed(body)
    } else {
        Cow::Borrowed(NOT_FOUND_MESSAGE)
    }
}

/// Message for a failed request: the joined error document, or the generic text.
pub fn extract_error(body: &str) -> String {
    match parse_error_xml(body) {
        Ok(msg) if !msg.is_empty() => msg,
        Ok(_) => INTERNAL_SERVER_ERROR_MESSAGE.to_string(),
        Err(e) => {
            tracing::debug!("unparseable error body: {}", e);
            INTERNAL_SERVER_ERROR_MESSAGE.to_string()
        }
    }
}

/// Reasons an error document is rejected.
#[derive(Error, Debug)]
pub enum ErrorDocumentError {
    #[error("xml parse: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("unclosed element <{0}>")]
    Unclosed(String),

    #[error("content outside the root element")]
    OutsideRoot,
}

/// Join the first text of every `errors/error` element with `" / "`.
///
/// The body must be a single well-formed document; character data or a
/// second element outside the root is rejected, as is a truncated body.
pub fn parse_error_xml(body: &str) -> Result<String, ErrorDocumentError> {
    let mut reader = Reader::from_str(body);
    reader.trim_text(true);

    // element names from the root down to the current position
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut root_closed = false;
    // first text of each entry, None until one is seen
    let mut entries: Vec<Option<String>> = Vec::new();
    // depth of the open errors/error element
    let mut current: Option<usize> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if path.is_empty() && root_closed {
                    return Err(ErrorDocumentError::OutsideRoot);
                }
                let name = e.name().as_ref().to_vec();
                if current.is_none() && is_error_entry(&path, &name) {
                    entries.push(None);
                    current = Some(path.len());
                }
                path.push(name);
            }
            Event::Empty(e) => {
                if path.is_empty() {
                    if root_closed {
                        return Err(ErrorDocumentError::OutsideRoot);
                    }
                    root_closed = true;
                }
                if current.is_none() && is_error_entry(&path, e.name().as_ref()) {
                    entries.push(None);
                }
            }
            Event::End(_) => {
                path.pop();
                if current == Some(path.len()) {
                    current = None;
                }
                if path.is_empty() {
                    root_closed = true;
                }
            }
            Event::Text(t) => {
                if path.is_empty() {
                    return Err(ErrorDocumentError::OutsideRoot);
                }
                if is_entry_child(current, &path) {
                    set_first_text(&mut entries, t.unescape()?.into_owned());
                }
            }
            Event::CData(c) => {
                if path.is_empty() {
                    return Err(ErrorDocumentError::OutsideRoot);
                }
                if is_entry_child(current, &path) {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    set_first_text(&mut entries, text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = path.last() {
        return Err(ErrorDocumentError::Unclosed(
            String::from_utf8_lossy(open).into_owned(),
        ));
    }

    Ok(entries
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect::<Vec<_>>()
        .join(" / "))
}

// text directly inside the open entry, not inside one of its children
fn is_entry_child(current: Option<usize>, path: &[Vec<u8>]) -> bool {
    current.map(|depth| depth + 1) == Some(path.len())
}

fn set_first_text(entries: &mut [Option<String>], text: String) {
    if let Some(entry) = entries.last_mut() {
        if entry.is_none() {
            *entry = Some(text);
        }
    }
}

fn is_error_entry(path: &[Vec<u8>], name: &[u8]) -> bool {
    name == b"error" && path.last().map(|p| p.as_slice()) == Some(b"errors".as_slice())
}
