//! `#[repr(C)]` request/response records exchanged with the driver service.
//!
//! Every record carries a version stamp the service uses to decide how to
//! interpret the rest of the struct. The field is private: `new()`/`Default`
//! are the only ways to build a record, and both stamp the current version.

use core::fmt;
use core::mem::size_of;

pub const UNICODE_STRING_MAX: usize = 2048;
pub const SHORT_STRING_MAX: usize = 64;
pub const BINARY_DATA_MAX: usize = 4096;

pub type UnicodeString = [u16; UNICODE_STRING_MAX];
pub type ShortString = [u8; SHORT_STRING_MAX];

// Setting value type tags.
pub const SETTING_TYPE_DWORD: u32 = 0;
pub const SETTING_TYPE_BINARY: u32 = 1;
pub const SETTING_TYPE_STRING: u32 = 2;
pub const SETTING_TYPE_WSTRING: u32 = 3;

// Where a setting's value is stored.
pub const LOCATION_CURRENT_PROFILE: u32 = 0;
pub const LOCATION_GLOBAL_PROFILE: u32 = 1;
pub const LOCATION_BASE_PROFILE: u32 = 2;
pub const LOCATION_DEFAULT: u32 = 3;

// Profile GPU support bits.
pub const GPU_SUPPORT_GEFORCE: u32 = 1 << 0;
pub const GPU_SUPPORT_QUADRO: u32 = 1 << 1;
pub const GPU_SUPPORT_NVS: u32 = 1 << 2;

/// Struct size in the low 16 bits, revision in the high 16.
pub const fn make_version(size: usize, revision: u32) -> u32 {
    (size as u32) | (revision << 16)
}

/// Implemented by every record that crosses the service boundary.
pub trait VersionedRecord {
    const VERSION: u32;

    fn version(&self) -> u32;

    fn has_current_version(&self) -> bool {
        self.version() == Self::VERSION
    }
}

// ---------- Strings ----------

/// Encode into a NUL-terminated wide buffer, truncating if needed.
pub fn encode_unicode(s: &str) -> UnicodeString {
    let mut out = [0u16; UNICODE_STRING_MAX];
    for (slot, unit) in out[..UNICODE_STRING_MAX - 1]
        .iter_mut()
        .zip(s.encode_utf16())
    {
        *slot = unit;
    }
    out
}

/// Like `encode_unicode` but refuses input that would not fit with its terminator.
pub fn try_encode_unicode(s: &str) -> Option<UnicodeString> {
    if s.encode_utf16().count() >= UNICODE_STRING_MAX {
        return None;
    }
    Some(encode_unicode(s))
}

/// Decode up to the first NUL, or the whole buffer if there is none.
pub fn decode_unicode(buf: &[u16]) -> String {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..end])
}

pub fn encode_short(s: &str) -> ShortString {
    let mut out = [0u8; SHORT_STRING_MAX];
    let bytes = s.as_bytes();
    let n = bytes.len().min(SHORT_STRING_MAX - 1);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

pub fn decode_short(buf: &[u8]) -> String {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

// ---------- Values ----------

#[repr(C)]
#[derive(Clone, Copy)]
pub struct BinaryValue {
    pub value_length: u32,
    pub value_data: [u8; BINARY_DATA_MAX],
}

/// Untagged storage for a setting value; the tag lives in `SettingRecord`.
///
/// Fields are private and every constructor zero-fills the whole union, so
/// each accessor reads initialized memory whatever variant was written last.
#[repr(C)]
#[derive(Clone, Copy)]
pub union RawValue {
    u32_value: u32,
    binary: BinaryValue,
    wsz_value: UnicodeString,
}

impl RawValue {
    pub const fn zeroed() -> Self {
        // `binary` is the widest member; initializing it covers every byte.
        RawValue {
            binary: BinaryValue {
                value_length: 0,
                value_data: [0; BINARY_DATA_MAX],
            },
        }
    }

    pub fn from_u32(value: u32) -> Self {
        let mut raw = Self::zeroed();
        raw.u32_value = value;
        raw
    }

    /// `None` if `data` exceeds `BINARY_DATA_MAX`.
    pub fn from_binary(data: &[u8]) -> Option<Self> {
        if data.len() > BINARY_DATA_MAX {
            return None;
        }
        let mut bin = BinaryValue {
            value_length: data.len() as u32,
            value_data: [0; BINARY_DATA_MAX],
        };
        bin.value_data[..data.len()].copy_from_slice(data);
        let mut raw = Self::zeroed();
        raw.binary = bin;
        Some(raw)
    }

    /// `None` if `text` does not fit with its terminator.
    pub fn from_wide(text: &str) -> Option<Self> {
        let wide = try_encode_unicode(text)?;
        let mut raw = Self::zeroed();
        raw.wsz_value = wide;
        Some(raw)
    }

    /// Raw length/data pair exactly as the service wrote it.
    pub fn with_binary_parts(value_length: u32, data: &[u8]) -> Self {
        let mut bin = BinaryValue {
            value_length,
            value_data: [0; BINARY_DATA_MAX],
        };
        let n = data.len().min(BINARY_DATA_MAX);
        bin.value_data[..n].copy_from_slice(&data[..n]);
        let mut raw = Self::zeroed();
        raw.binary = bin;
        raw
    }

    pub fn with_wide_units(units: &UnicodeString) -> Self {
        let mut raw = Self::zeroed();
        raw.wsz_value = *units;
        raw
    }

    #[inline]
    pub fn as_u32(&self) -> u32 {
        // SAFETY: all bytes are initialized (see type docs) and any bit pattern is a valid u32.
        unsafe { self.u32_value }
    }

    #[inline]
    pub fn as_binary(&self) -> &BinaryValue {
        // SAFETY: as above; BinaryValue is plain integers.
        unsafe { &self.binary }
    }

    #[inline]
    pub fn as_wide(&self) -> &UnicodeString {
        // SAFETY: as above; u16 array, union alignment is 4.
        unsafe { &self.wsz_value }
    }
}

impl Default for RawValue {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawValue { .. }")
    }
}

// ---------- Records ----------

#[repr(C)]
#[derive(Clone, Copy)]
pub struct ProfileInfoRecord {
    version: u32,
    pub profile_name: UnicodeString,
    pub gpu_support: u32,
    pub is_predefined: u32,
    pub num_of_apps: u32,
    pub num_of_settings: u32,
}

impl ProfileInfoRecord {
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            profile_name: [0; UNICODE_STRING_MAX],
            gpu_support: 0,
            is_predefined: 0,
            num_of_apps: 0,
            num_of_settings: 0,
        }
    }
}

impl VersionedRecord for ProfileInfoRecord {
    const VERSION: u32 = make_version(size_of::<ProfileInfoRecord>(), 1);

    fn version(&self) -> u32 {
        self.version
    }
}

impl Default for ProfileInfoRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProfileInfoRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileInfoRecord")
            .field("version", &self.version)
            .field("profile_name", &decode_unicode(&self.profile_name))
            .field("gpu_support", &self.gpu_support)
            .field("is_predefined", &self.is_predefined)
            .field("num_of_apps", &self.num_of_apps)
            .field("num_of_settings", &self.num_of_settings)
            .finish()
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct ApplicationRecord {
    version: u32,
    pub is_predefined: u32,
    pub app_name: UnicodeString,
    pub user_friendly_name: UnicodeString,
    pub launcher: UnicodeString,
}

impl ApplicationRecord {
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            is_predefined: 0,
            app_name: [0; UNICODE_STRING_MAX],
            user_friendly_name: [0; UNICODE_STRING_MAX],
            launcher: [0; UNICODE_STRING_MAX],
        }
    }
}

impl VersionedRecord for ApplicationRecord {
    const VERSION: u32 = make_version(size_of::<ApplicationRecord>(), 1);

    fn version(&self) -> u32 {
        self.version
    }
}

impl Default for ApplicationRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ApplicationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationRecord")
            .field("version", &self.version)
            .field("is_predefined", &self.is_predefined)
            .field("app_name", &decode_unicode(&self.app_name))
            .field("user_friendly_name", &decode_unicode(&self.user_friendly_name))
            .field("launcher", &decode_unicode(&self.launcher))
            .finish()
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct SettingRecord {
    version: u32,
    pub setting_name: UnicodeString,
    pub setting_id: u32,
    pub setting_type: u32,
    pub setting_location: u32,
    pub is_current_predefined: u32,
    pub is_predefined_valid: u32,
    pub predefined_value: RawValue,
    pub current_value: RawValue,
}

impl SettingRecord {
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            setting_name: [0; UNICODE_STRING_MAX],
            setting_id: 0,
            setting_type: 0,
            setting_location: 0,
            is_current_predefined: 0,
            is_predefined_valid: 0,
            predefined_value: RawValue::zeroed(),
            current_value: RawValue::zeroed(),
        }
    }
}

impl VersionedRecord for SettingRecord {
    const VERSION: u32 = make_version(size_of::<SettingRecord>(), 1);

    fn version(&self) -> u32 {
        self.version
    }
}

impl Default for SettingRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SettingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingRecord")
            .field("version", &self.version)
            .field("setting_id", &format_args!("{:#X}", self.setting_id))
            .field("setting_type", &self.setting_type)
            .field("setting_location", &self.setting_location)
            .field("is_current_predefined", &self.is_current_predefined)
            .field("is_predefined_valid", &self.is_predefined_valid)
            .finish_non_exhaustive()
    }
}
