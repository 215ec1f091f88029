use dirs::data_dir;
use std::path::PathBuf;

pub const ENV_HOME: &str = "DRSPROBE_HOME";

pub fn drsprobe_home() -> PathBuf {
    if let Some(home) = std::env::var_os(ENV_HOME) {
        return PathBuf::from(home);
    }
    // Linux resolves to ~/.local/share/DrsProbe
    data_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("DrsProbe")
}

pub fn cache_dir() -> PathBuf {
    drsprobe_home().join("cache")
}
pub fn cache_snapshot_dir() -> PathBuf {
    cache_dir().join("snapshot")
}
pub fn snapshot_path() -> PathBuf {
    cache_snapshot_dir().join("snapshot.json")
}
