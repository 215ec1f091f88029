use drsprobe_abi::Status;
use thiserror::Error;

/// Everything that can go wrong talking to the driver settings service.
///
/// Reaching the end of an enumeration is not in here: it is a normal
/// terminal state of `ProfileEnumerator`, never an error.
#[derive(Debug, Error)]
pub enum DrsError {
    #[error("driver service initialization failed: {message} [{status}]")]
    InitializationFailure { status: Status, message: String },

    #[error("could not create settings session: {message} [{status}]")]
    SessionCreationFailure { status: Status, message: String },

    #[error("could not load driver settings: {message} [{status}]")]
    LoadFailure { status: Status, message: String },

    #[error("profile info unavailable: {message} [{status}]")]
    ProfileInfoUnavailable { status: Status, message: String },

    #[error("{what} enumeration failed: {message} [{status}]")]
    EnumerationFailed {
        what: &'static str,
        status: Status,
        message: String,
    },

    /// Buffer was still too small after the single retry.
    #[error("{what} enumeration truncated: {reported} items reported, capacity {capacity}")]
    TruncatedResult {
        what: &'static str,
        capacity: u32,
        reported: u32,
    },

    #[error("unknown setting value type tag {tag}")]
    UnknownValueType { tag: u32 },

    #[error("malformed setting value: {reason}")]
    MalformedValue { reason: String },

    #[error("service returned unrecognized status code {code}: {message}")]
    UnknownStatus { code: i32, message: String },

    /// The service asked for more items than a single page may hold, or the
    /// buffer could not be allocated.
    #[error("{what} buffer of {requested} items refused (limit {limit})")]
    BufferUnavailable {
        what: &'static str,
        requested: u32,
        limit: u32,
    },

    #[error("{what} query failed: {message} [{status}]")]
    QueryFailed {
        what: &'static str,
        status: Status,
        message: String,
    },

    #[error("session is closed")]
    SessionClosed,

    #[error("settings have not been loaded for this session")]
    NotLoaded,

    #[error("profile handle belongs to another session")]
    ForeignHandle,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl DrsError {
    /// Service status behind this error, if it came from a service call.
    pub fn status(&self) -> Option<Status> {
        match self {
            DrsError::InitializationFailure { status, .. }
            | DrsError::SessionCreationFailure { status, .. }
            | DrsError::LoadFailure { status, .. }
            | DrsError::ProfileInfoUnavailable { status, .. }
            | DrsError::EnumerationFailed { status, .. }
            | DrsError::QueryFailed { status, .. } => Some(*status),
            DrsError::TruncatedResult { .. } => Some(Status::INSUFFICIENT_BUFFER),
            DrsError::UnknownStatus { code, .. } => Some(Status(*code)),
            _ => None,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, DrsError::TruncatedResult { .. })
    }
}

pub type Result<T> = std::result::Result<T, DrsError>;
