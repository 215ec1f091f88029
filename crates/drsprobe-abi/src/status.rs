//! Status codes returned by every driver settings service call.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Raw status code as reported by the service. Known codes are associated
/// constants; anything else is protocol drift and classifies to `None`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Status(pub i32);

/// Coarse classification the core branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Ok,
    /// "No item at this index". Terminates enumerations; not an error.
    EndOfEnumeration,
    /// Caller's buffer was too small for what the service wanted to return.
    InsufficientBuffer,
    Failure,
}

impl Status {
    pub const OK: Status = Status(0);
    pub const ERROR: Status = Status(-1);
    pub const LIBRARY_NOT_FOUND: Status = Status(-2);
    pub const NO_IMPLEMENTATION: Status = Status(-3);
    pub const API_NOT_INITIALIZED: Status = Status(-4);
    pub const INVALID_ARGUMENT: Status = Status(-5);
    pub const DEVICE_NOT_FOUND: Status = Status(-6);
    pub const END_ENUMERATION: Status = Status(-7);
    pub const INVALID_HANDLE: Status = Status(-8);
    pub const INCOMPATIBLE_STRUCT_VERSION: Status = Status(-9);
    pub const HANDLE_INVALIDATED: Status = Status(-10);
    pub const INVALID_POINTER: Status = Status(-14);
    pub const INSUFFICIENT_BUFFER: Status = Status(-140);
    pub const SETTING_NOT_FOUND: Status = Status(-160);
    pub const PROFILE_NOT_FOUND: Status = Status(-163);

    #[inline]
    pub fn code(self) -> i32 {
        self.0
    }

    #[inline]
    pub fn is_ok(self) -> bool {
        self == Status::OK
    }

    /// Symbolic name for known codes.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Status::OK => "OK",
            Status::ERROR => "ERROR",
            Status::LIBRARY_NOT_FOUND => "LIBRARY_NOT_FOUND",
            Status::NO_IMPLEMENTATION => "NO_IMPLEMENTATION",
            Status::API_NOT_INITIALIZED => "API_NOT_INITIALIZED",
            Status::INVALID_ARGUMENT => "INVALID_ARGUMENT",
            Status::DEVICE_NOT_FOUND => "DEVICE_NOT_FOUND",
            Status::END_ENUMERATION => "END_ENUMERATION",
            Status::INVALID_HANDLE => "INVALID_HANDLE",
            Status::INCOMPATIBLE_STRUCT_VERSION => "INCOMPATIBLE_STRUCT_VERSION",
            Status::HANDLE_INVALIDATED => "HANDLE_INVALIDATED",
            Status::INVALID_POINTER => "INVALID_POINTER",
            Status::INSUFFICIENT_BUFFER => "INSUFFICIENT_BUFFER",
            Status::SETTING_NOT_FOUND => "SETTING_NOT_FOUND",
            Status::PROFILE_NOT_FOUND => "PROFILE_NOT_FOUND",
            _ => return None,
        };
        Some(name)
    }

    /// `None` when the code is not part of the known table.
    pub fn kind(self) -> Option<StatusKind> {
        match self {
            Status::OK => Some(StatusKind::Ok),
            Status::END_ENUMERATION => Some(StatusKind::EndOfEnumeration),
            Status::INSUFFICIENT_BUFFER => Some(StatusKind::InsufficientBuffer),
            s if s.name().is_some() => Some(StatusKind::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "status({})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_codes() {
        assert_eq!(Status::OK.kind(), Some(StatusKind::Ok));
        assert_eq!(Status(-7).kind(), Some(StatusKind::EndOfEnumeration));
        assert_eq!(
            Status::INSUFFICIENT_BUFFER.kind(),
            Some(StatusKind::InsufficientBuffer)
        );
        assert_eq!(Status::INVALID_HANDLE.kind(), Some(StatusKind::Failure));
    }

    #[test]
    fn unknown_codes_have_no_kind() {
        assert_eq!(Status(-9999).kind(), None);
        assert_eq!(Status(42).kind(), None);
        assert_eq!(Status(-9999).to_string(), "status(-9999)");
    }

    #[test]
    fn display_uses_symbolic_name() {
        assert_eq!(Status::END_ENUMERATION.to_string(), "END_ENUMERATION (-7)");
    }
}
