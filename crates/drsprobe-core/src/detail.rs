//! One profile's metadata plus its applications and current-profile settings.

use drsprobe_abi::{
    decode_unicode, ApplicationRecord, DriverSettingsApi, ProfileInfoRecord, RawProfileHandle,
    SettingRecord, Status,
};
use tracing::{debug, warn};

use crate::error::{DrsError, Result};
use crate::paged::{PagedFetch, PagedSource};
use crate::session::{ProfileRef, SettingsSession};
use crate::types::{Application, GpuSupport, ProfileRecord, Setting, SettingLocation};
use crate::value::SettingValue;

pub struct ProfileDetail<'s, A: DriverSettingsApi> {
    session: &'s SettingsSession<'s, A>,
}

impl<'s, A: DriverSettingsApi> ProfileDetail<'s, A> {
    pub fn new(session: &'s SettingsSession<'s, A>) -> Self {
        Self { session }
    }

    pub fn fetch(&self, profile: ProfileRef) -> Result<ProfileRecord> {
        let raw = self.session.resolve(profile)?;
        let info = profile_info(self.session, raw)?;

        let mut record = ProfileRecord {
            name: decode_unicode(&info.profile_name),
            is_predefined: info.is_predefined != 0,
            gpu_support: GpuSupport::from_bits(info.gpu_support),
            app_count: info.num_of_apps,
            setting_count: info.num_of_settings,
            applications: Vec::new(),
            settings: Vec::new(),
            skipped_settings: 0,
        };

        if info.num_of_apps > 0 {
            let page = PagedFetch::new(ApplicationSource {
                session: self.session,
                profile: raw,
            })
            .fetch_with_capacity(0, info.num_of_apps)?;
            record.applications = page.items.iter().map(Application::from).collect();
        }

        if info.num_of_settings > 0 {
            let page = PagedFetch::new(SettingSource {
                session: self.session,
                profile: raw,
            })
            .fetch_with_capacity(0, info.num_of_settings)?;

            // Filter before decoding: out-of-scope settings are never decoded or named.
            let (current, inherited): (Vec<&SettingRecord>, Vec<&SettingRecord>) =
                page.items.iter().partition(|s| {
                    SettingLocation::from_raw(s.setting_location)
                        == Some(SettingLocation::CurrentProfile)
                });
            record.skipped_settings = inherited.len() as u32;
            record.settings = current
                .into_iter()
                .map(|s| self.decode_setting(s, SettingLocation::CurrentProfile))
                .collect::<Result<Vec<_>>>()?;
        }

        debug!(
            target: "drsprobe::detail",
            profile = %record.name,
            apps = record.applications.len(),
            settings = record.settings.len(),
            skipped = record.skipped_settings,
            "profile fetched"
        );
        Ok(record)
    }

    fn decode_setting(&self, rec: &SettingRecord, location: SettingLocation) -> Result<Setting> {
        let value = SettingValue::decode(rec.setting_type, &rec.current_value).map_err(|e| {
            warn!(
                target: "drsprobe::detail",
                setting_id = format_args!("{:#X}", rec.setting_id),
                error = %e,
                "setting value could not be decoded"
            );
            e
        })?;

        let config = self.session.config();
        let predefined_value = if config.decode_predefined_values && rec.is_predefined_valid != 0
        {
            Some(SettingValue::decode(
                rec.setting_type,
                &rec.predefined_value,
            )?)
        } else {
            None
        };

        let name = if config.resolve_setting_names {
            self.lookup_name(rec)
        } else {
            None
        };

        Ok(Setting {
            id: rec.setting_id,
            name,
            location,
            is_predefined: rec.is_current_predefined != 0,
            value,
            predefined_value,
        })
    }

    /// Driver lookup first, then whatever name the record itself carried.
    fn lookup_name(&self, rec: &SettingRecord) -> Option<String> {
        match self.session.setting_name(rec.setting_id) {
            Ok(name) if !name.is_empty() => Some(name),
            Ok(_) => None,
            Err(e) => {
                debug!(
                    target: "drsprobe::detail",
                    setting_id = format_args!("{:#X}", rec.setting_id),
                    error = %e,
                    "setting name lookup failed"
                );
                let embedded = decode_unicode(&rec.setting_name);
                (!embedded.is_empty()).then_some(embedded)
            }
        }
    }
}

fn profile_info<A: DriverSettingsApi>(
    session: &SettingsSession<'_, A>,
    profile: RawProfileHandle,
) -> Result<ProfileInfoRecord> {
    let mut info = ProfileInfoRecord::new();
    let status = session
        .api()
        .get_profile_info(session.handle(), profile, &mut info);
    session.check(status, |status, message| DrsError::ProfileInfoUnavailable {
        status,
        message,
    })?;
    Ok(info)
}

// ---------- Paged sources ----------

struct ApplicationSource<'s, A: DriverSettingsApi> {
    session: &'s SettingsSession<'s, A>,
    profile: RawProfileHandle,
}

impl<A: DriverSettingsApi> PagedSource for ApplicationSource<'_, A> {
    type Item = ApplicationRecord;
    const LABEL: &'static str = "application";

    fn reported_count(&self) -> Result<u32> {
        Ok(profile_info(self.session, self.profile)?.num_of_apps)
    }

    fn enumerate(&self, start_index: u32, count: &mut u32, buf: &mut [ApplicationRecord]) -> Status {
        self.session.api().enum_applications(
            self.session.handle(),
            self.profile,
            start_index,
            count,
            buf,
        )
    }

    fn error_message(&self, status: Status) -> String {
        self.session.error_message(status)
    }
}

struct SettingSource<'s, A: DriverSettingsApi> {
    session: &'s SettingsSession<'s, A>,
    profile: RawProfileHandle,
}

impl<A: DriverSettingsApi> PagedSource for SettingSource<'_, A> {
    type Item = SettingRecord;
    const LABEL: &'static str = "setting";

    fn reported_count(&self) -> Result<u32> {
        Ok(profile_info(self.session, self.profile)?.num_of_settings)
    }

    fn enumerate(&self, start_index: u32, count: &mut u32, buf: &mut [SettingRecord]) -> Status {
        self.session.api().enum_settings(
            self.session.handle(),
            self.profile,
            start_index,
            count,
            buf,
        )
    }

    fn error_message(&self, status: Status) -> String {
        self.session.error_message(status)
    }
}
