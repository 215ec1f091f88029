use std::iter::FusedIterator;

use drsprobe_abi::{DriverSettingsApi, RawProfileHandle, StatusKind};
use tracing::debug;

use crate::error::{DrsError, Result};
use crate::session::{ProfileRef, SettingsSession};

/// Where a profile walk stands.
///
/// `Exhausted` is the only clean stop. `Failed` keeps the error that ended the
/// walk so callers can tell the two apart once `next()` returns `None`.
#[derive(Debug)]
pub enum EnumState {
    Init,
    Enumerating,
    Exhausted,
    Failed(DrsError),
}

/// Walks a session's profiles by index: 0, 1, 2, ... until the service
/// answers `END_ENUMERATION`.
pub struct ProfileEnumerator<'s, A: DriverSettingsApi> {
    session: &'s SettingsSession<'s, A>,
    index: u32,
    state: EnumState,
}

impl<'s, A: DriverSettingsApi> ProfileEnumerator<'s, A> {
    pub fn new(session: &'s SettingsSession<'s, A>) -> Self {
        Self {
            session,
            index: 0,
            state: EnumState::Init,
        }
    }

    #[inline]
    pub fn state(&self) -> &EnumState {
        &self.state
    }

    /// Index the next call to `next()` will request.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, EnumState::Exhausted)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, EnumState::Failed(_))
    }

    pub fn is_terminal(&self) -> bool {
        self.is_exhausted() || self.is_failed()
    }

    pub fn failure(&self) -> Option<&DrsError> {
        match &self.state {
            EnumState::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Drain whatever is left and report how the walk ended: the number of
    /// profiles visited, or the error that stopped it.
    pub fn finish(mut self) -> Result<u32> {
        while self.next().is_some() {}
        match self.state {
            EnumState::Failed(e) => Err(e),
            _ => Ok(self.index),
        }
    }

    fn fail(&mut self, err: DrsError) {
        debug!(target: "drsprobe::enumerate", index = self.index, error = %err, "profile enumeration failed");
        self.state = EnumState::Failed(err);
    }
}

impl<A: DriverSettingsApi> Iterator for ProfileEnumerator<'_, A> {
    type Item = ProfileRef;

    fn next(&mut self) -> Option<ProfileRef> {
        if self.is_terminal() {
            return None;
        }
        if let Err(e) = self.session.ensure_loaded() {
            self.fail(e);
            return None;
        }
        self.state = EnumState::Enumerating;

        let mut raw = RawProfileHandle::default();
        let status = self
            .session
            .api()
            .enum_profiles(self.session.handle(), self.index, &mut raw);

        match status.kind() {
            Some(StatusKind::Ok) => {
                self.index += 1;
                Some(self.session.bind(raw))
            }
            Some(StatusKind::EndOfEnumeration) => {
                debug!(target: "drsprobe::enumerate", count = self.index, "profile enumeration exhausted");
                self.state = EnumState::Exhausted;
                None
            }
            Some(_) => {
                let message = self.session.error_message(status);
                self.fail(DrsError::EnumerationFailed {
                    what: "profile",
                    status,
                    message,
                });
                None
            }
            None => {
                let message = self.session.error_message(status);
                self.fail(DrsError::UnknownStatus {
                    code: status.code(),
                    message,
                });
                None
            }
        }
    }
}

impl<A: DriverSettingsApi> FusedIterator for ProfileEnumerator<'_, A> {}
