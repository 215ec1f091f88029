//! Scripted in-memory driver settings service for integration tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use drsprobe_core::abi::{
    encode_short, encode_unicode, ApplicationRecord, DriverSettingsApi, ProfileInfoRecord,
    RawProfileHandle, RawSessionHandle, RawValue, SettingRecord, ShortString, Status,
    UnicodeString, VersionedRecord, LOCATION_CURRENT_PROFILE,
};
use drsprobe_core::{Driver, ProbeConfig, SettingValue, SettingsSession};

#[derive(Debug, Clone)]
pub struct FakeApp {
    pub exe: String,
    pub friendly: String,
    pub predefined: bool,
}

#[derive(Debug, Clone)]
pub struct FakeSetting {
    pub id: u32,
    pub location: u32,
    pub predefined: bool,
    /// Raw tag and payload, so tests can inject tags the core does not know.
    pub tag: u32,
    pub raw: RawValue,
    pub predefined_raw: Option<RawValue>,
}

impl FakeSetting {
    pub fn current(id: u32, value: SettingValue) -> Self {
        Self::at(id, LOCATION_CURRENT_PROFILE, value)
    }

    pub fn at(id: u32, location: u32, value: SettingValue) -> Self {
        let (tag, raw) = value.encode().expect("test value fits");
        Self {
            id,
            location,
            predefined: false,
            tag,
            raw,
            predefined_raw: None,
        }
    }

    pub fn with_predefined(mut self, value: SettingValue) -> Self {
        let (_, raw) = value.encode().expect("test value fits");
        self.predefined = true;
        self.predefined_raw = Some(raw);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeProfile {
    pub name: String,
    pub predefined: bool,
    pub gpu_support: u32,
    pub apps: Vec<FakeApp>,
    pub settings: Vec<FakeSetting>,
    /// Make `get_profile_info` fail for this profile.
    pub info_failure: Option<Status>,
}

impl FakeProfile {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn app(mut self, exe: &str, friendly: &str) -> Self {
        self.apps.push(FakeApp {
            exe: exe.into(),
            friendly: friendly.into(),
            predefined: false,
        });
        self
    }

    pub fn setting(mut self, s: FakeSetting) -> Self {
        self.settings.push(s);
        self
    }
}

/// Every call is counted; failures are injected per operation.
#[derive(Default)]
pub struct FakeDriver {
    pub profiles: RefCell<Vec<FakeProfile>>,
    pub setting_names: HashMap<u32, String>,
    pub global_profile: Option<usize>,
    pub interface_version: Option<String>,

    pub fail_initialize: Cell<Option<Status>>,
    pub fail_create: Cell<Option<Status>>,
    pub fail_load: Cell<Option<Status>>,
    /// (index, status) returned by `enum_profiles` instead of a handle.
    pub fail_enum_at: Cell<Option<(u32, Status)>>,
    pub fail_enum_apps: Cell<Option<Status>>,
    /// Replies consumed by successive `enum_settings` calls before normal behavior.
    pub settings_replies: RefCell<VecDeque<Status>>,
    /// Settings appended to profile 0 the first time `enum_settings` runs.
    pub grow_settings_by: RefCell<Vec<FakeSetting>>,

    pub initialize_calls: Cell<u32>,
    pub create_calls: Cell<u32>,
    pub load_calls: Cell<u32>,
    pub destroy_calls: Cell<u32>,
    pub enum_app_calls: Cell<u32>,
    pub enum_setting_calls: Cell<u32>,
    pub setting_capacities: RefCell<Vec<u32>>,
    pub name_lookups: RefCell<Vec<u32>>,
    pub enum_indices: RefCell<Vec<u32>>,

    next_session: Cell<usize>,
    live_sessions: RefCell<Vec<usize>>,
}

impl FakeDriver {
    pub fn with_profiles(profiles: Vec<FakeProfile>) -> Self {
        Self {
            profiles: RefCell::new(profiles),
            ..Self::default()
        }
    }

    /// Profile A: no apps, one Integer setting 0x1F = 0x1.
    /// Profile B: one app "game.exe"/"My Game", no settings.
    pub fn two_profile_repository() -> Self {
        let mut driver = Self::with_profiles(vec![
            FakeProfile::named("A").setting(FakeSetting::current(0x1F, SettingValue::Integer(0x1))),
            FakeProfile::named("B").app("game.exe", "My Game"),
        ]);
        driver
            .setting_names
            .insert(0x1F, "Vertical Sync Tear Control".into());
        driver
    }

    fn bump(c: &Cell<u32>) {
        c.set(c.get() + 1);
    }

    fn profile_index(&self, profile: RawProfileHandle) -> Option<usize> {
        let idx = profile.0.checked_sub(1)?;
        (idx < self.profiles.borrow().len()).then_some(idx)
    }

    fn session_ok(&self, session: RawSessionHandle) -> bool {
        self.live_sessions.borrow().contains(&session.0)
    }
}

impl DriverSettingsApi for FakeDriver {
    fn initialize(&self) -> Status {
        Self::bump(&self.initialize_calls);
        self.fail_initialize.get().unwrap_or(Status::OK)
    }

    fn create_session(&self, session: &mut RawSessionHandle) -> Status {
        Self::bump(&self.create_calls);
        if let Some(st) = self.fail_create.get() {
            return st;
        }
        let id = self.next_session.get() + 100;
        self.next_session.set(id);
        self.live_sessions.borrow_mut().push(id);
        *session = RawSessionHandle(id);
        Status::OK
    }

    fn load_settings(&self, session: RawSessionHandle) -> Status {
        Self::bump(&self.load_calls);
        if !self.session_ok(session) {
            return Status::INVALID_HANDLE;
        }
        self.fail_load.get().unwrap_or(Status::OK)
    }

    fn enum_profiles(
        &self,
        session: RawSessionHandle,
        index: u32,
        profile: &mut RawProfileHandle,
    ) -> Status {
        self.enum_indices.borrow_mut().push(index);
        if !self.session_ok(session) {
            return Status::INVALID_HANDLE;
        }
        if let Some((at, st)) = self.fail_enum_at.get() {
            if at == index {
                return st;
            }
        }
        if index as usize >= self.profiles.borrow().len() {
            return Status::END_ENUMERATION;
        }
        *profile = RawProfileHandle(index as usize + 1);
        Status::OK
    }

    fn get_profile_info(
        &self,
        session: RawSessionHandle,
        profile: RawProfileHandle,
        info: &mut ProfileInfoRecord,
    ) -> Status {
        if !info.has_current_version() {
            return Status::INCOMPATIBLE_STRUCT_VERSION;
        }
        if !self.session_ok(session) {
            return Status::INVALID_HANDLE;
        }
        let Some(idx) = self.profile_index(profile) else {
            return Status::PROFILE_NOT_FOUND;
        };
        let profiles = self.profiles.borrow();
        let p = &profiles[idx];
        if let Some(st) = p.info_failure {
            return st;
        }
        info.profile_name = encode_unicode(&p.name);
        info.is_predefined = p.predefined as u32;
        info.gpu_support = p.gpu_support;
        info.num_of_apps = p.apps.len() as u32;
        info.num_of_settings = p.settings.len() as u32;
        Status::OK
    }

    fn enum_applications(
        &self,
        session: RawSessionHandle,
        profile: RawProfileHandle,
        start_index: u32,
        count: &mut u32,
        apps: &mut [ApplicationRecord],
    ) -> Status {
        Self::bump(&self.enum_app_calls);
        if apps.iter().any(|a| !a.has_current_version()) {
            return Status::INCOMPATIBLE_STRUCT_VERSION;
        }
        if !self.session_ok(session) {
            return Status::INVALID_HANDLE;
        }
        if let Some(st) = self.fail_enum_apps.get() {
            return st;
        }
        let Some(idx) = self.profile_index(profile) else {
            return Status::PROFILE_NOT_FOUND;
        };
        let profiles = self.profiles.borrow();
        let src = profiles[idx].apps.iter().skip(start_index as usize);
        let mut n = 0;
        for (slot, app) in apps.iter_mut().take(*count as usize).zip(src) {
            slot.app_name = encode_unicode(&app.exe);
            slot.user_friendly_name = encode_unicode(&app.friendly);
            slot.is_predefined = app.predefined as u32;
            n += 1;
        }
        *count = n;
        Status::OK
    }

    fn enum_settings(
        &self,
        session: RawSessionHandle,
        profile: RawProfileHandle,
        start_index: u32,
        count: &mut u32,
        settings: &mut [SettingRecord],
    ) -> Status {
        Self::bump(&self.enum_setting_calls);
        self.setting_capacities.borrow_mut().push(*count);
        if settings.iter().any(|s| !s.has_current_version()) {
            return Status::INCOMPATIBLE_STRUCT_VERSION;
        }
        if !self.session_ok(session) {
            return Status::INVALID_HANDLE;
        }
        let Some(idx) = self.profile_index(profile) else {
            return Status::PROFILE_NOT_FOUND;
        };

        let grow: Vec<FakeSetting> = self.grow_settings_by.borrow_mut().drain(..).collect();
        if !grow.is_empty() {
            self.profiles.borrow_mut()[idx].settings.extend(grow);
        }
        if let Some(st) = self.settings_replies.borrow_mut().pop_front() {
            return st;
        }

        let profiles = self.profiles.borrow();
        let all = &profiles[idx].settings;
        let available = all.len().saturating_sub(start_index as usize);
        if available > *count as usize {
            *count = available as u32;
            return Status::INSUFFICIENT_BUFFER;
        }
        let mut n = 0;
        for (slot, s) in settings.iter_mut().zip(all.iter().skip(start_index as usize)) {
            slot.setting_id = s.id;
            slot.setting_type = s.tag;
            slot.setting_location = s.location;
            slot.is_current_predefined = s.predefined as u32;
            slot.current_value = s.raw;
            if let Some(p) = s.predefined_raw {
                slot.is_predefined_valid = 1;
                slot.predefined_value = p;
            }
            n += 1;
        }
        *count = n;
        Status::OK
    }

    fn get_setting_name_from_id(&self, setting_id: u32, name: &mut UnicodeString) -> Status {
        self.name_lookups.borrow_mut().push(setting_id);
        match self.setting_names.get(&setting_id) {
            Some(n) => {
                *name = encode_unicode(n);
                Status::OK
            }
            None => Status::SETTING_NOT_FOUND,
        }
    }

    fn get_error_message(&self, status: Status, message: &mut ShortString) -> Status {
        *message = encode_short(&format!("fake: {}", status.name().unwrap_or("unknown")));
        Status::OK
    }

    fn destroy_session(&self, session: RawSessionHandle) {
        Self::bump(&self.destroy_calls);
        self.live_sessions.borrow_mut().retain(|s| *s != session.0);
    }

    fn get_current_global_profile(
        &self,
        _session: RawSessionHandle,
        profile: &mut RawProfileHandle,
    ) -> Status {
        match self.global_profile {
            Some(i) => {
                *profile = RawProfileHandle(i + 1);
                Status::OK
            }
            None => Status::PROFILE_NOT_FOUND,
        }
    }

    fn get_interface_version_string(&self, version: &mut ShortString) -> Status {
        match &self.interface_version {
            Some(v) => {
                *version = encode_short(v);
                Status::OK
            }
            None => Status::NO_IMPLEMENTATION,
        }
    }
}

/// Open and load with default config, independent of the process environment.
pub fn open_loaded(driver: &Driver<FakeDriver>) -> SettingsSession<'_, FakeDriver> {
    let mut session =
        SettingsSession::open_with_config(driver, ProbeConfig::default()).expect("open session");
    session.load().expect("load settings");
    session
}
