//! Process-scoped driver wrapper and the session lifecycle built on it:
//! open -> load -> (enumerate / query) -> close.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use drsprobe_abi::{
    decode_short, decode_unicode, DriverSettingsApi, RawProfileHandle, RawSessionHandle, Status,
    StatusKind, SHORT_STRING_MAX, UNICODE_STRING_MAX,
};
use once_cell::unsync::OnceCell;
use tracing::{debug, warn};

use crate::config::ProbeConfig;
use crate::detail::ProfileDetail;
use crate::enumerator::ProfileEnumerator;
use crate::error::{DrsError, Result};
use crate::types::ProfileRecord;

/// Owns the service and its one-time initialization.
pub struct Driver<A> {
    api: A,
    initialized: OnceCell<()>,
}

impl<A: DriverSettingsApi> Driver<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            initialized: OnceCell::new(),
        }
    }

    #[inline]
    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get().is_some()
    }

    /// Runs the service's `initialize` once; later calls are no-ops.
    /// A failed attempt is not remembered, so the next call tries again.
    pub fn initialize(&self) -> Result<()> {
        self.initialized.get_or_try_init(|| {
            debug!(target: "drsprobe::driver", "initializing driver settings service");
            let status = self.api.initialize();
            self.check(status, |status, message| DrsError::InitializationFailure {
                status,
                message,
            })
        })?;
        Ok(())
    }

    /// Human-readable text for `status`, falling back to its symbolic name.
    pub fn error_message(&self, status: Status) -> String {
        let mut buf = [0u8; SHORT_STRING_MAX];
        if self.api.get_error_message(status, &mut buf).is_ok() {
            let msg = decode_short(&buf);
            if !msg.is_empty() {
                return msg;
            }
        }
        status.to_string()
    }

    pub fn interface_version(&self) -> Result<String> {
        self.initialize()?;
        let mut buf = [0u8; SHORT_STRING_MAX];
        let status = self.api.get_interface_version_string(&mut buf);
        self.check(status, |status, message| DrsError::QueryFailed {
            what: "interface version",
            status,
            message,
        })?;
        Ok(decode_short(&buf))
    }

    pub fn open_session(&self) -> Result<SettingsSession<'_, A>> {
        SettingsSession::open(self)
    }

    /// Ok on success, `UnknownStatus` for codes outside the known table,
    /// otherwise whatever `fail` builds from the status and its message.
    pub(crate) fn check<F>(&self, status: Status, fail: F) -> Result<()>
    where
        F: FnOnce(Status, String) -> DrsError,
    {
        match status.kind() {
            Some(StatusKind::Ok) => Ok(()),
            Some(_) => Err(fail(status, self.error_message(status))),
            None => Err(DrsError::UnknownStatus {
                code: status.code(),
                message: self.error_message(status),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Loaded,
    Closed,
}

/// Profile handle bound to the session that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProfileRef {
    raw: RawProfileHandle,
    session: u64,
}

impl ProfileRef {
    #[inline]
    pub fn raw(&self) -> RawProfileHandle {
        self.raw
    }

    #[inline]
    pub fn session_serial(&self) -> u64 {
        self.session
    }
}

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// A live connection to the settings repository.
///
/// Not `Send`/`Sync`: one thread drives a session at a time. Dropping the
/// session closes it.
pub struct SettingsSession<'d, A: DriverSettingsApi> {
    driver: &'d Driver<A>,
    handle: RawSessionHandle,
    serial: u64,
    state: SessionState,
    config: ProbeConfig,
    _not_send: PhantomData<*const ()>,
}

impl<'d, A: DriverSettingsApi> SettingsSession<'d, A> {
    pub fn open(driver: &'d Driver<A>) -> Result<Self> {
        Self::open_with_config(driver, ProbeConfig::from_env())
    }

    pub fn open_with_config(driver: &'d Driver<A>, config: ProbeConfig) -> Result<Self> {
        driver.initialize()?;

        let mut handle = RawSessionHandle::default();
        let status = driver.api().create_session(&mut handle);
        driver.check(status, |status, message| DrsError::SessionCreationFailure {
            status,
            message,
        })?;

        let serial = NEXT_SERIAL.fetch_add(1, Ordering::Relaxed);
        debug!(target: "drsprobe::session", serial, handle = handle.0, "session opened");

        Ok(Self {
            driver,
            handle,
            serial,
            state: SessionState::Open,
            config,
            _not_send: PhantomData,
        })
    }

    /// Open and load in one step. A load failure still releases the session.
    pub fn open_loaded(driver: &'d Driver<A>) -> Result<Self> {
        let mut session = Self::open(driver)?;
        session.load()?;
        Ok(session)
    }

    /// Pull the repository into the session. May be repeated to reload.
    pub fn load(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Err(DrsError::SessionClosed);
        }
        let status = self.api().load_settings(self.handle);
        self.driver
            .check(status, |status, message| DrsError::LoadFailure { status, message })?;
        self.state = SessionState::Loaded;
        debug!(target: "drsprobe::session", serial = self.serial, "settings loaded");
        Ok(())
    }

    /// Best-effort release. Runs the service teardown at most once; calling it
    /// again is a no-op.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.driver.api().destroy_session(self.handle);
        self.state = SessionState::Closed;
        debug!(target: "drsprobe::session", serial = self.serial, "session closed");
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != SessionState::Closed
    }

    #[inline]
    pub fn handle(&self) -> RawSessionHandle {
        self.handle
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn driver(&self) -> &'d Driver<A> {
        self.driver
    }

    /// Walk every profile by index until the service signals the end.
    pub fn profiles(&self) -> ProfileEnumerator<'_, A> {
        ProfileEnumerator::new(self)
    }

    pub fn profile_detail(&self, profile: ProfileRef) -> Result<ProfileRecord> {
        ProfileDetail::new(self).fetch(profile)
    }

    pub fn current_global_profile(&self) -> Result<ProfileRef> {
        self.ensure_loaded()?;
        let mut raw = RawProfileHandle::default();
        let status = self
            .api()
            .get_current_global_profile(self.handle, &mut raw);
        self.driver.check(status, |status, message| DrsError::QueryFailed {
            what: "current global profile",
            status,
            message,
        })?;
        Ok(self.bind(raw))
    }

    pub fn base_profile(&self) -> Result<ProfileRef> {
        self.ensure_loaded()?;
        let mut raw = RawProfileHandle::default();
        let status = self.api().get_base_profile(self.handle, &mut raw);
        self.driver.check(status, |status, message| DrsError::QueryFailed {
            what: "base profile",
            status,
            message,
        })?;
        Ok(self.bind(raw))
    }

    /// Display name the driver associates with a setting id.
    pub fn setting_name(&self, setting_id: u32) -> Result<String> {
        let mut buf = [0u16; UNICODE_STRING_MAX];
        let status = self.api().get_setting_name_from_id(setting_id, &mut buf);
        self.driver.check(status, |status, message| DrsError::QueryFailed {
            what: "setting name",
            status,
            message,
        })?;
        Ok(decode_unicode(&buf))
    }

    // ---------- crate-internal plumbing ----------

    #[inline]
    pub(crate) fn api(&self) -> &A {
        self.driver.api()
    }

    pub(crate) fn error_message(&self, status: Status) -> String {
        self.driver.error_message(status)
    }

    pub(crate) fn check<F>(&self, status: Status, fail: F) -> Result<()>
    where
        F: FnOnce(Status, String) -> DrsError,
    {
        self.driver.check(status, fail)
    }

    pub(crate) fn ensure_loaded(&self) -> Result<()> {
        match self.state {
            SessionState::Loaded => Ok(()),
            SessionState::Open => Err(DrsError::NotLoaded),
            SessionState::Closed => Err(DrsError::SessionClosed),
        }
    }

    pub(crate) fn bind(&self, raw: RawProfileHandle) -> ProfileRef {
        ProfileRef {
            raw,
            session: self.serial,
        }
    }

    /// Raw handle for `profile`, provided it came from this still-loaded session.
    pub(crate) fn resolve(&self, profile: ProfileRef) -> Result<RawProfileHandle> {
        self.ensure_loaded()?;
        if profile.session != self.serial {
            warn!(
                target: "drsprobe::session",
                expected = self.serial,
                got = profile.session,
                "profile handle from another session"
            );
            return Err(DrsError::ForeignHandle);
        }
        Ok(profile.raw)
    }
}

impl<A: DriverSettingsApi> Drop for SettingsSession<'_, A> {
    fn drop(&mut self) {
        self.close();
    }
}
