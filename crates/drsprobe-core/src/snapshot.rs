//! Whole-repository walk: every profile, fetched in enumeration order.

use drsprobe_abi::DriverSettingsApi;
use tracing::{debug, warn};

use crate::detail::ProfileDetail;
use crate::error::Result;
use crate::session::SettingsSession;
use crate::types::{ProfileFailure, SettingsSnapshot, SNAPSHOT_SCHEMA, SNAPSHOT_SCHEMA_MINOR};

/// Capture every profile of a loaded session.
///
/// A profile whose detail fetch fails is recorded in `failures` and the walk
/// moves on; only a failed enumeration aborts the capture. Fingerprint and
/// timestamps are left empty for the cache layer to stamp.
pub fn capture<A: DriverSettingsApi>(session: &SettingsSession<'_, A>) -> Result<SettingsSnapshot> {
    let detail = ProfileDetail::new(session);
    let mut profiles = Vec::new();
    let mut failures = Vec::new();

    let mut walk = session.profiles();
    while let Some(profile) = walk.next() {
        let index = walk.index() - 1;
        match detail.fetch(profile) {
            Ok(record) => profiles.push(record),
            Err(e) => {
                warn!(target: "drsprobe::snapshot", index, error = %e, "profile skipped");
                failures.push(ProfileFailure {
                    index,
                    error: e.to_string(),
                    status: e.status().map(|s| s.code()),
                });
            }
        }
    }
    let visited = walk.finish()?;

    // Optional hook; a driver without it just leaves the field empty.
    let interface_version = session.driver().interface_version().ok();

    debug!(
        target: "drsprobe::snapshot",
        visited,
        captured = profiles.len(),
        failed = failures.len(),
        "capture complete"
    );

    Ok(SettingsSnapshot {
        schema: SNAPSHOT_SCHEMA,
        schema_minor: SNAPSHOT_SCHEMA_MINOR,
        interface_version,
        profiles,
        failures,
        fingerprint: String::new(),
        created_at: String::new(),
        updated_at: String::new(),
    })
}
