//! Sync cycle state machine.
//!
//! # Responsibility
//! - Reject overlapping sync cycles.
//! - Invalidate in-flight cycles on cancellation so late results are dropped.
//!
//! # Invariants
//! - At most one ticket is current at any time.
//! - `cancel_in_flight` makes every previously issued ticket stale.
//! - State transitions: `Idle|Done|Error -> Fetching -> Reconciling -> Done`,
//!   with `Fetching|Reconciling -> Error` on failure and `-> Idle` on cancel.

use crate::error::{QuoteError, QuoteResult};
use crate::model::quote::now_timestamp;
use log::{info, warn};

/// Phase of the current (or last) sync cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Idle,
    Fetching,
    Reconciling,
    Done,
    Error,
}

impl SyncState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Reconciling => "reconciling",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// Returns whether a cycle is running in this state.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Fetching | Self::Reconciling)
    }
}

/// Proof that the holder started the current sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTicket {
    generation: u64,
}

impl SyncTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
pub struct SyncEngine {
    state: SyncState,
    generation: u64,
    last_error: Option<String>,
    last_completed_at: Option<String>,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_completed_at(&self) -> Option<&str> {
        self.last_completed_at.as_deref()
    }

    /// Starts a cycle and enters `Fetching`.
    ///
    /// # Errors
    /// - `QuoteError::SyncBusy` while another cycle is in flight.
    pub fn begin(&mut self) -> QuoteResult<SyncTicket> {
        if self.state.is_in_flight() {
            info!(
                "event=sync_begin module=sync status=rejected state={}",
                self.state.as_str()
            );
            return Err(QuoteError::SyncBusy(self.state));
        }
        self.generation = self.generation.wrapping_add(1);
        self.state = SyncState::Fetching;
        info!(
            "event=sync_begin module=sync status=ok generation={}",
            self.generation
        );
        Ok(SyncTicket {
            generation: self.generation,
        })
    }

    /// Returns whether `ticket` belongs to the running cycle.
    pub fn is_current(&self, ticket: SyncTicket) -> bool {
        ticket.generation == self.generation && self.state.is_in_flight()
    }

    /// Moves from `Fetching` to `Reconciling`.
    ///
    /// # Errors
    /// - `QuoteError::SyncCancelled` when the ticket is stale.
    pub fn start_reconciling(&mut self, ticket: SyncTicket) -> QuoteResult<()> {
        self.require_current(ticket)?;
        self.state = SyncState::Reconciling;
        Ok(())
    }

    /// Completes the cycle successfully.
    pub fn finish(&mut self, ticket: SyncTicket) -> QuoteResult<()> {
        self.require_current(ticket)?;
        self.state = SyncState::Done;
        self.last_error = None;
        self.last_completed_at = Some(now_timestamp());
        info!(
            "event=sync_finish module=sync status=ok generation={}",
            ticket.generation
        );
        Ok(())
    }

    /// Records a failure for the running cycle; stale tickets are ignored.
    pub fn fail(&mut self, ticket: SyncTicket, message: impl Into<String>) {
        if !self.is_current(ticket) {
            return;
        }
        let message = message.into();
        warn!(
            "event=sync_finish module=sync status=error generation={} error={}",
            ticket.generation, message
        );
        self.state = SyncState::Error;
        self.last_error = Some(message);
    }

    /// Invalidates every issued ticket; returns whether a cycle was running.
    pub fn cancel_in_flight(&mut self) -> bool {
        let was_running = self.state.is_in_flight();
        self.generation = self.generation.wrapping_add(1);
        if was_running {
            self.state = SyncState::Idle;
            info!(
                "event=sync_cancel module=sync status=ok generation={}",
                self.generation
            );
        }
        was_running
    }

    fn require_current(&self, ticket: SyncTicket) -> QuoteResult<()> {
        if self.is_current(ticket) {
            Ok(())
        } else {
            Err(QuoteError::SyncCancelled)
        }
    }
}
