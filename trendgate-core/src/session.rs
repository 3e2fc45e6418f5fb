//! Trading session: the daily state and the orchestrator behind one lock.
//!
//! An evaluation takes the lock twice: once for the limiter pre-check, and
//! once to re-check the limits and count a signal. The stages in between run
//! unlocked, so sessions shared across threads evaluate in parallel while
//! the check-then-count on the daily state stays atomic.

use crate::engine::{Decision, EvaluationRequest, PipelineError, SignalOrchestrator};
use crate::premium::PremiumSource;
use crate::risk::{DailySnapshot, DailyState, TradeOutcome};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

pub struct TradingSession {
    orchestrator: SignalOrchestrator,
    state: Mutex<DailyState>,
}

impl TradingSession {
    /// Resume from a persisted state.
    pub fn new(orchestrator: SignalOrchestrator, state: DailyState) -> Self {
        Self {
            orchestrator,
            state: Mutex::new(state),
        }
    }

    /// Start a fresh session for `date`.
    pub fn start(orchestrator: SignalOrchestrator, date: NaiveDate) -> Self {
        Self::new(orchestrator, DailyState::new(date))
    }

    pub fn orchestrator(&self) -> &SignalOrchestrator {
        &self.orchestrator
    }

    pub fn evaluate(
        &self,
        request: &EvaluationRequest<'_>,
        premiums: &dyn PremiumSource,
    ) -> Result<Decision, PipelineError> {
        let gated = self.orchestrator.check_limits(request, &mut self.lock())?;
        if let Some(gated) = gated {
            return Ok(gated);
        }
        let decision = self.orchestrator.run_stages(request, premiums)?;
        Ok(self.orchestrator.commit(decision, &mut self.lock(), request.now))
    }

    pub fn record_outcome(&self, outcome: TradeOutcome, now: DateTime<Utc>) -> Result<(), PipelineError> {
        let mut state = self.lock();
        self.orchestrator.record_outcome(&mut state, outcome, now)
    }

    /// Explicit session boundary: counters zeroed, any pause lifted.
    pub fn reset(&self, date: NaiveDate) {
        let mut state = self.lock();
        self.orchestrator.reset_session(&mut state, date);
    }

    /// Reset when the market-local date of `now` differs from the session
    /// date. Returns whether a reset happened.
    pub fn roll_to(&self, now: DateTime<Utc>) -> bool {
        let today = self.orchestrator.session_date(now);
        let mut state = self.lock();
        if state.session_date == Some(today) {
            return false;
        }
        info!(previous = ?state.session_date, %today, "new trading day");
        self.orchestrator.reset_session(&mut state, today);
        true
    }

    pub fn snapshot(&self) -> DailySnapshot {
        self.orchestrator.snapshot(&self.lock())
    }

    /// Copy of the current state, for persistence.
    pub fn state(&self) -> DailyState {
        self.lock().clone()
    }

    pub fn into_state(self) -> DailyState {
        self.state.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, DailyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
