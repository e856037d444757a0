//! crates/freeplotter_core/src/sequence.rs
//!
//! Per-slot request sequencing. Every remote call that writes back into shared
//! session state carries a [`Ticket`]; only the latest ticket issued for a slot
//! may apply its response, so an older response that arrives late is dropped.

/// A logical slot of session state that remote responses write into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestSlot {
    /// The follow-up question shown under the editor.
    Prompt,
    /// The open "show don't tell" suggestion.
    Suggestion,
    /// The license check behind the license gate.
    License,
}

impl RequestSlot {
    fn index(self) -> usize {
        match self {
            RequestSlot::Prompt => 0,
            RequestSlot::Suggestion => 1,
            RequestSlot::License => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    slot: RequestSlot,
    seq: u64,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    latest: [u64; 3],
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket that supersedes every earlier ticket of the same slot.
    pub fn issue(&mut self, slot: RequestSlot) -> Ticket {
        let counter = &mut self.latest[slot.index()];
        *counter += 1;
        Ticket {
            slot,
            seq: *counter,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest[ticket.slot.index()] == ticket.seq
    }

    /// Makes every outstanding ticket of `slot` stale.
    pub fn invalidate(&mut self, slot: RequestSlot) {
        self.latest[slot.index()] += 1;
    }

    /// Makes the session's outstanding tickets stale. License checks are
    /// not tied to a story and are left alone.
    pub fn invalidate_all(&mut self) {
        self.invalidate(RequestSlot::Prompt);
        self.invalidate(RequestSlot::Suggestion);
    }
}
