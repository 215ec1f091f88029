use drsprobe_abi::{
    decode_unicode, ApplicationRecord, GPU_SUPPORT_GEFORCE, GPU_SUPPORT_NVS, GPU_SUPPORT_QUADRO,
    LOCATION_BASE_PROFILE, LOCATION_CURRENT_PROFILE, LOCATION_DEFAULT, LOCATION_GLOBAL_PROFILE,
};
use serde::{Deserialize, Serialize};

use crate::value::SettingValue;

pub const SNAPSHOT_SCHEMA: u32 = 1;
pub const SNAPSHOT_SCHEMA_MINOR: u16 = 1;

/// One profile with its applications and current-profile settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub name: String,
    pub is_predefined: bool,
    #[serde(default)]
    pub gpu_support: GpuSupport,

    // Counts as reported by the profile metadata (upper bounds).
    pub app_count: u32,
    pub setting_count: u32,

    pub applications: Vec<Application>,
    pub settings: Vec<Setting>,

    /// Settings stored elsewhere (global/base/default) and left out of `settings`.
    #[serde(default)]
    pub skipped_settings: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GpuSupport {
    pub geforce: bool,
    pub quadro: bool,
    pub nvs: bool,
}

impl GpuSupport {
    pub fn from_bits(bits: u32) -> Self {
        Self {
            geforce: bits & GPU_SUPPORT_GEFORCE != 0,
            quadro: bits & GPU_SUPPORT_QUADRO != 0,
            nvs: bits & GPU_SUPPORT_NVS != 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub executable: String,
    pub friendly_name: String,
    #[serde(default)]
    pub launcher: Option<String>,
    pub is_predefined: bool,
}

impl From<&ApplicationRecord> for Application {
    fn from(rec: &ApplicationRecord) -> Self {
        let launcher = decode_unicode(&rec.launcher);
        Self {
            executable: decode_unicode(&rec.app_name),
            friendly_name: decode_unicode(&rec.user_friendly_name),
            launcher: (!launcher.is_empty()).then_some(launcher),
            is_predefined: rec.is_predefined != 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub id: u32,
    pub name: Option<String>,
    pub location: SettingLocation,
    pub is_predefined: bool,
    pub value: SettingValue,
    #[serde(default)]
    pub predefined_value: Option<SettingValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingLocation {
    CurrentProfile,
    GlobalProfile,
    BaseProfile,
    Default,
}

impl SettingLocation {
    pub fn from_raw(tag: u32) -> Option<Self> {
        match tag {
            LOCATION_CURRENT_PROFILE => Some(Self::CurrentProfile),
            LOCATION_GLOBAL_PROFILE => Some(Self::GlobalProfile),
            LOCATION_BASE_PROFILE => Some(Self::BaseProfile),
            LOCATION_DEFAULT => Some(Self::Default),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u32 {
        match self {
            Self::CurrentProfile => LOCATION_CURRENT_PROFILE,
            Self::GlobalProfile => LOCATION_GLOBAL_PROFILE,
            Self::BaseProfile => LOCATION_BASE_PROFILE,
            Self::Default => LOCATION_DEFAULT,
        }
    }
}

/// A profile whose detail fetch failed during a whole-repository walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFailure {
    pub index: u32,
    pub error: String,
    #[serde(default)]
    pub status: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    pub schema: u32,
    #[serde(default)]
    pub schema_minor: u16,

    #[serde(default)]
    pub interface_version: Option<String>,

    pub profiles: Vec<ProfileRecord>,
    #[serde(default)]
    pub failures: Vec<ProfileFailure>,

    // Stamped by the cache layer.
    pub fingerprint: String,
    pub created_at: String,
    pub updated_at: String,
}
