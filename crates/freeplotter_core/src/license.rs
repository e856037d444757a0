//! crates/freeplotter_core/src/license.rs
//!
//! Client-side license gating. A key is only ever trusted after the remote
//! service confirms it; the gate tracks that confirmation for the running app.
//!
//! Checks follow the same two-phase shape as the writing session: `begin_check`
//! hands out a [`LicenseCheck`] carrying the key and a ticket, and only the
//! latest check may settle the gate when its outcome comes back.

use crate::domain::LicenseKey;
use crate::ports::{PortError, PortResult};
use crate::sequence::{RequestSequencer, RequestSlot, Ticket};

pub const INVALID_LICENSE_NOTICE: &str =
    "It's expired or invalid. Please enter a valid License Key to continue using Freeplotter.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseStatus {
    Unchecked,
    Checking,
    Valid,
    Invalid,
}

/// What the caller must do with its persisted key after a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseVerdict {
    /// Persist this key as the active license.
    Confirm(LicenseKey),
    /// Clear any stored key.
    Reject,
}

/// One license check in flight: the key that was sent and its ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseCheck {
    pub key: LicenseKey,
    ticket: Ticket,
}

impl LicenseCheck {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }
}

#[derive(Debug, Clone)]
pub struct LicenseGate {
    /// Outcome of the last settled check. A check in flight never changes it.
    settled: LicenseStatus,
    pending: Option<Ticket>,
    notice: Option<String>,
    sequencer: RequestSequencer,
}

impl Default for LicenseGate {
    fn default() -> Self {
        Self::new()
    }
}

impl LicenseGate {
    pub fn new() -> Self {
        Self {
            settled: LicenseStatus::Unchecked,
            pending: None,
            notice: None,
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn status(&self) -> LicenseStatus {
        if self.pending.is_some() {
            LicenseStatus::Checking
        } else {
            self.settled
        }
    }

    pub fn is_checking(&self) -> bool {
        self.pending.is_some()
    }

    /// Gated features are available while the last settled check confirmed a
    /// key, including while another key is being checked.
    pub fn is_unlocked(&self) -> bool {
        self.settled == LicenseStatus::Valid
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Fails with `Unauthorized` unless a license has been confirmed.
    pub fn require_unlocked(&self) -> PortResult<()> {
        if self.is_unlocked() {
            Ok(())
        } else {
            Err(PortError::Unauthorized)
        }
    }

    /// Starts a check for the entered key. Any check already in flight is
    /// superseded and its outcome will be ignored.
    pub fn begin_check(&mut self, raw_key: &str) -> PortResult<LicenseCheck> {
        let key = LicenseKey::new(raw_key)
            .ok_or_else(|| PortError::Validation("Please enter a License Key.".to_string()))?;
        let ticket = self.sequencer.issue(RequestSlot::License);
        self.pending = Some(ticket);
        Ok(LicenseCheck { key, ticket })
    }

    /// Applies the remote verdict for `check`.
    ///
    /// Returns `Ok(None)` when a newer check superseded this one; nothing
    /// changes in that case. A transport or service failure keeps the previous
    /// status and is returned to the caller; only an explicit `false` rejects
    /// the key.
    pub fn finish_check(
        &mut self,
        check: LicenseCheck,
        outcome: PortResult<bool>,
    ) -> PortResult<Option<LicenseVerdict>> {
        if !self.sequencer.is_current(check.ticket) {
            return Ok(None);
        }

        self.pending = None;
        match outcome {
            Ok(true) => {
                self.settled = LicenseStatus::Valid;
                self.notice = None;
                Ok(Some(LicenseVerdict::Confirm(check.key)))
            }
            Ok(false) => {
                self.settled = LicenseStatus::Invalid;
                self.notice = Some(INVALID_LICENSE_NOTICE.to_string());
                Ok(Some(LicenseVerdict::Reject))
            }
            Err(e) => Err(e),
        }
    }

    /// Forgets a check whose caller went away before the outcome arrived.
    pub fn abandon_check(&mut self, ticket: Ticket) {
        if self.pending == Some(ticket) {
            self.pending = None;
            self.sequencer.invalidate(RequestSlot::License);
        }
    }

    /// Closes the invalid-license notice. Only a gate that rejected its key
    /// asks for the stored key to be cleared; any other status is left as is.
    pub fn acknowledge_notice(&mut self) -> Option<LicenseVerdict> {
        self.notice = None;
        if self.settled == LicenseStatus::Invalid {
            self.settled = LicenseStatus::Unchecked;
            Some(LicenseVerdict::Reject)
        } else {
            None
        }
    }
}
