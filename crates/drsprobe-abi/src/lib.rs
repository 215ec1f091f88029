//! drsprobe ABI crate: stable contracts shared by the introspection core and
//! whatever transport talks to the driver settings service.

pub mod handle;
pub mod records;
pub mod service;
pub mod status;

pub use handle::*;
pub use records::*;
pub use service::*;
pub use status::*;
