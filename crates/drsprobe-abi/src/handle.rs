use serde::{Deserialize, Serialize};

/// Opaque session handle handed out by the driver service. Zero means "none".
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RawSessionHandle(pub usize);

/// Opaque profile handle. Only meaningful inside the session that produced it.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RawProfileHandle(pub usize);

impl RawSessionHandle {
    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl RawProfileHandle {
    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}
