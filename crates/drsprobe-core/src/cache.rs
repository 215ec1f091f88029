use crate::paths::snapshot_path;
use crate::session::SettingsSession;
use crate::snapshot::capture;
use crate::types::SettingsSnapshot;
use crate::value::SettingValue;
use anyhow::{Context, Result};
use chrono::Utc;
use drsprobe_abi::DriverSettingsApi;
use serde_json as json;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::debug;

pub fn load_cached() -> Option<SettingsSnapshot> {
    load_snapshot_from(&snapshot_path()).ok()
}

pub fn load_snapshot_from(path: &Path) -> Result<SettingsSnapshot> {
    let buf = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let snap = json::from_slice::<SettingsSnapshot>(&buf)
        .with_context(|| format!("parse {}", path.display()))?;
    Ok(snap)
}

pub fn save_snapshot(s: &SettingsSnapshot) -> Result<()> {
    save_snapshot_to(&snapshot_path(), s)
}

/// Write through a sibling tmp file and rename, so readers never see a half-written file.
pub fn save_snapshot_to(path: &Path, s: &SettingsSnapshot) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("mkd {}", dir.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json::to_vec_pretty(s)?)
        .with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("rename to {}", path.display()))?;
    Ok(())
}

/// Captures now and caches the result, returning the fresh snapshot.
pub fn capture_and_cache<A: DriverSettingsApi>(
    session: &SettingsSession<'_, A>,
) -> Result<SettingsSnapshot> {
    capture_and_cache_to(session, &snapshot_path())
}

pub fn capture_and_cache_to<A: DriverSettingsApi>(
    session: &SettingsSession<'_, A>,
    path: &Path,
) -> Result<SettingsSnapshot> {
    let mut s = capture(session)?;
    s.fingerprint = compute_fingerprint(&s);
    let now = Utc::now().to_rfc3339();
    s.created_at = now.clone();
    s.updated_at = now;
    save_snapshot_to(path, &s)?;
    Ok(s)
}

/// Re-capture and rewrite the cache only if the content fingerprint changed.
/// Returns the current snapshot and whether the file was rewritten.
pub fn refresh_if_changed<A: DriverSettingsApi>(
    session: &SettingsSession<'_, A>,
) -> Result<(SettingsSnapshot, bool)> {
    refresh_if_changed_at(session, &snapshot_path())
}

pub fn refresh_if_changed_at<A: DriverSettingsApi>(
    session: &SettingsSession<'_, A>,
    path: &Path,
) -> Result<(SettingsSnapshot, bool)> {
    let cached = load_snapshot_from(path).ok();
    let mut fresh = capture(session)?;
    fresh.fingerprint = compute_fingerprint(&fresh);

    match cached {
        Some(c) if c.fingerprint == fresh.fingerprint => {
            debug!(target: "drsprobe::cache", fingerprint = %c.fingerprint, "snapshot unchanged");
            Ok((c, false))
        }
        cached => {
            let now = Utc::now().to_rfc3339();
            fresh.created_at = cached.map(|c| c.created_at).unwrap_or_else(|| now.clone());
            fresh.updated_at = now;
            save_snapshot_to(path, &fresh)?;
            Ok((fresh, true))
        }
    }
}

/// Content hash over what the driver reported. Timestamps and per-profile
/// failures are not part of it.
pub fn compute_fingerprint(s: &SettingsSnapshot) -> String {
    let mut hasher = Sha256::new();

    hasher.update(s.schema.to_le_bytes());
    hash_opt_str(&mut hasher, s.interface_version.as_deref());

    for p in &s.profiles {
        hash_str(&mut hasher, &p.name);
        hasher.update([
            p.is_predefined as u8,
            p.gpu_support.geforce as u8,
            p.gpu_support.quadro as u8,
            p.gpu_support.nvs as u8,
        ]);
        hasher.update(p.app_count.to_le_bytes());
        hasher.update(p.setting_count.to_le_bytes());

        for a in &p.applications {
            hash_str(&mut hasher, &a.executable);
            hash_str(&mut hasher, &a.friendly_name);
            hash_opt_str(&mut hasher, a.launcher.as_deref());
            hasher.update([a.is_predefined as u8]);
        }
        for st in &p.settings {
            hasher.update(st.id.to_le_bytes());
            hash_opt_str(&mut hasher, st.name.as_deref());
            hasher.update(st.location.as_raw().to_le_bytes());
            hasher.update([st.is_predefined as u8]);
            hash_value(&mut hasher, &st.value);
            match &st.predefined_value {
                Some(v) => {
                    hasher.update([1u8]);
                    hash_value(&mut hasher, v);
                }
                None => hasher.update([0u8]),
            }
        }
        hasher.update(p.skipped_settings.to_le_bytes());
    }

    hex::encode(hasher.finalize())
}

/// NUL-terminated so adjacent strings cannot run into each other.
fn hash_str(hasher: &mut Sha256, s: &str) {
    hasher.update(s.as_bytes());
    hasher.update([0u8]);
}

fn hash_opt_str(hasher: &mut Sha256, s: Option<&str>) {
    match s {
        Some(s) => {
            hasher.update([1u8]);
            hash_str(hasher, s);
        }
        None => hasher.update([0u8]),
    }
}

fn hash_value(hasher: &mut Sha256, v: &SettingValue) {
    hasher.update(v.type_tag().to_le_bytes());
    match v {
        SettingValue::Integer(n) => hasher.update(n.to_le_bytes()),
        SettingValue::Binary(bytes) => {
            hasher.update((bytes.len() as u32).to_le_bytes());
            hasher.update(bytes);
        }
        SettingValue::Text(t) => hash_str(hasher, t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Application, GpuSupport, ProfileRecord, Setting, SettingLocation};
    use rstest::rstest;

    fn sample() -> SettingsSnapshot {
        SettingsSnapshot {
            schema: 1,
            schema_minor: 1,
            interface_version: None,
            profiles: vec![ProfileRecord {
                name: "Gaming".into(),
                is_predefined: false,
                gpu_support: GpuSupport::default(),
                app_count: 1,
                setting_count: 1,
                applications: vec![Application {
                    executable: "game.exe".into(),
                    friendly_name: "My Game".into(),
                    launcher: None,
                    is_predefined: false,
                }],
                settings: vec![Setting {
                    id: 0x1F,
                    name: None,
                    location: SettingLocation::CurrentProfile,
                    is_predefined: false,
                    value: SettingValue::Integer(1),
                    predefined_value: None,
                }],
                skipped_settings: 0,
            }],
            failures: Vec::new(),
            fingerprint: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[rstest]
    #[case::setting_name(|s: &mut SettingsSnapshot| {
        s.profiles[0].settings[0].name = Some("Vertical Sync Tear Control".into())
    })]
    #[case::setting_location(|s: &mut SettingsSnapshot| {
        s.profiles[0].settings[0].location = SettingLocation::GlobalProfile
    })]
    #[case::launcher(|s: &mut SettingsSnapshot| {
        s.profiles[0].applications[0].launcher = Some("steam.exe".into())
    })]
    #[case::predefined_value(|s: &mut SettingsSnapshot| {
        s.profiles[0].settings[0].predefined_value = Some(SettingValue::Integer(1))
    })]
    #[case::interface_version(|s: &mut SettingsSnapshot| {
        s.interface_version = Some("R550".into())
    })]
    fn every_reported_field_moves_the_fingerprint(#[case] change: fn(&mut SettingsSnapshot)) {
        let base = sample();
        let mut changed = sample();
        change(&mut changed);
        assert_ne!(compute_fingerprint(&changed), compute_fingerprint(&base));
    }

    #[test]
    fn string_boundaries_are_kept() {
        let mut a = sample();
        a.profiles[0].applications[0].executable = "ab".into();
        a.profiles[0].applications[0].friendly_name = "c".into();
        let mut b = sample();
        b.profiles[0].applications[0].executable = "a".into();
        b.profiles[0].applications[0].friendly_name = "bc".into();
        assert_ne!(compute_fingerprint(&a), compute_fingerprint(&b));
    }

    #[test]
    fn failures_and_timestamps_are_ignored() {
        let base = compute_fingerprint(&sample());
        let mut s = sample();
        s.created_at = "2024-01-01T00:00:00+00:00".into();
        s.failures.push(crate::types::ProfileFailure {
            index: 3,
            error: "boom".into(),
            status: Some(-1),
        });
        assert_eq!(compute_fingerprint(&s), base);
    }
}
