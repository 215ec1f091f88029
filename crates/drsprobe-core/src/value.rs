//! Typed setting values decoded from the tagged raw union.

use core::fmt;

use drsprobe_abi::{
    decode_unicode, RawValue, BINARY_DATA_MAX, SETTING_TYPE_BINARY, SETTING_TYPE_DWORD,
    SETTING_TYPE_WSTRING,
};
use serde::{Deserialize, Serialize};

use crate::error::{DrsError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SettingValue {
    Integer(u32),
    Binary(Vec<u8>),
    Text(String),
}

impl SettingValue {
    /// Pick the variant selected by `tag` and read only that one.
    pub fn decode(tag: u32, raw: &RawValue) -> Result<Self> {
        match tag {
            SETTING_TYPE_DWORD => Ok(SettingValue::Integer(raw.as_u32())),
            SETTING_TYPE_BINARY => {
                let bin = raw.as_binary();
                let len = bin.value_length as usize;
                if len > BINARY_DATA_MAX {
                    return Err(DrsError::MalformedValue {
                        reason: format!(
                            "binary length {len} exceeds {BINARY_DATA_MAX}-byte buffer"
                        ),
                    });
                }
                Ok(SettingValue::Binary(bin.value_data[..len].to_vec()))
            }
            SETTING_TYPE_WSTRING => Ok(SettingValue::Text(decode_unicode(raw.as_wide()))),
            other => Err(DrsError::UnknownValueType { tag: other }),
        }
    }

    /// Inverse of `decode`. Refuses values that do not fit the raw buffers.
    pub fn encode(&self) -> Result<(u32, RawValue)> {
        match self {
            SettingValue::Integer(v) => Ok((SETTING_TYPE_DWORD, RawValue::from_u32(*v))),
            SettingValue::Binary(bytes) => RawValue::from_binary(bytes)
                .map(|raw| (SETTING_TYPE_BINARY, raw))
                .ok_or_else(|| DrsError::MalformedValue {
                    reason: format!("binary value of {} bytes does not fit", bytes.len()),
                }),
            SettingValue::Text(s) => RawValue::from_wide(s)
                .map(|raw| (SETTING_TYPE_WSTRING, raw))
                .ok_or_else(|| DrsError::MalformedValue {
                    reason: "text value does not fit".into(),
                }),
        }
    }

    pub fn type_tag(&self) -> u32 {
        match self {
            SettingValue::Integer(_) => SETTING_TYPE_DWORD,
            SettingValue::Binary(_) => SETTING_TYPE_BINARY,
            SettingValue::Text(_) => SETTING_TYPE_WSTRING,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            SettingValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            SettingValue::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Integer(v) => write!(f, "{v:#X}"),
            SettingValue::Binary(bytes) => {
                write!(f, "binary(len={})", bytes.len())?;
                for b in bytes {
                    write!(f, " {b:02x}")?;
                }
                Ok(())
            }
            SettingValue::Text(s) => f.write_str(s),
        }
    }
}
