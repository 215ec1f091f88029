use crate::handle::{RawProfileHandle, RawSessionHandle};
use crate::records::{
    ApplicationRecord, ProfileInfoRecord, SettingRecord, ShortString, UnicodeString,
};
use crate::status::Status;

/// The external driver settings service, as consumed by the core.
///
/// Calls are synchronous and may block for as long as the service takes.
/// Out-parameters follow the service's convention: the caller allocates and
/// version-stamps every record, the service fills them in and reports a
/// `Status`. Implementations are not expected to be thread-safe; the core
/// serializes all access to a session.
pub trait DriverSettingsApi {
    /// Process-wide setup. Must succeed before any session is created.
    fn initialize(&self) -> Status;

    fn create_session(&self, session: &mut RawSessionHandle) -> Status;

    fn load_settings(&self, session: RawSessionHandle) -> Status;

    /// `END_ENUMERATION` once `index` is past the last profile.
    fn enum_profiles(
        &self,
        session: RawSessionHandle,
        index: u32,
        profile: &mut RawProfileHandle,
    ) -> Status;

    fn get_profile_info(
        &self,
        session: RawSessionHandle,
        profile: RawProfileHandle,
        info: &mut ProfileInfoRecord,
    ) -> Status;

    /// `count` is the usable capacity of `apps` on input and the number of
    /// records written on output.
    fn enum_applications(
        &self,
        session: RawSessionHandle,
        profile: RawProfileHandle,
        start_index: u32,
        count: &mut u32,
        apps: &mut [ApplicationRecord],
    ) -> Status;

    /// Same in/out `count` convention as `enum_applications`.
    fn enum_settings(
        &self,
        session: RawSessionHandle,
        profile: RawProfileHandle,
        start_index: u32,
        count: &mut u32,
        settings: &mut [SettingRecord],
    ) -> Status;

    fn get_setting_name_from_id(&self, setting_id: u32, name: &mut UnicodeString) -> Status;

    fn get_error_message(&self, status: Status, message: &mut ShortString) -> Status;

    /// Best-effort release; the service reports nothing back.
    fn destroy_session(&self, session: RawSessionHandle);

    // ========== OPTIONAL HOOKS ==========

    /// Profile currently applied globally.
    fn get_current_global_profile(
        &self,
        _session: RawSessionHandle,
        _profile: &mut RawProfileHandle,
    ) -> Status {
        Status::NO_IMPLEMENTATION
    }

    /// Profile every other profile inherits from.
    fn get_base_profile(
        &self,
        _session: RawSessionHandle,
        _profile: &mut RawProfileHandle,
    ) -> Status {
        Status::NO_IMPLEMENTATION
    }

    fn get_interface_version_string(&self, _version: &mut ShortString) -> Status {
        Status::NO_IMPLEMENTATION
    }
}
