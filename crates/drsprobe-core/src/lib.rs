//! drsprobe core: read-only introspection of a GPU driver's settings repository.
//!
//! Open a session, load the repository, walk its profiles, and pull each
//! profile's applications and typed settings. Captures can be cached to
//! ~/.local/share/DrsProbe/cache/snapshot/snapshot.json for later diffing.

pub mod cache;
pub mod config;
pub mod detail;
pub mod enumerator;
pub mod error;
pub mod logging;
pub mod paged;
pub mod paths;
pub mod session;
pub mod snapshot;
pub mod types;
pub mod value;

pub use cache::{
    capture_and_cache, capture_and_cache_to, compute_fingerprint, load_cached, load_snapshot_from,
    refresh_if_changed, refresh_if_changed_at, save_snapshot, save_snapshot_to,
};
pub use config::ProbeConfig;
pub use detail::ProfileDetail;
pub use enumerator::{EnumState, ProfileEnumerator};
pub use error::{DrsError, Result};
pub use logging::init_logging;
pub use paged::{Page, PagedFetch, PagedSource};
pub use paths::{cache_dir, cache_snapshot_dir, drsprobe_home, snapshot_path};
pub use session::{Driver, ProfileRef, SessionState, SettingsSession};
pub use snapshot::capture;
pub use types::{
    Application, GpuSupport, ProfileFailure, ProfileRecord, Setting, SettingLocation,
    SettingsSnapshot, SNAPSHOT_SCHEMA, SNAPSHOT_SCHEMA_MINOR,
};
pub use value::SettingValue;

pub use drsprobe_abi as abi;
