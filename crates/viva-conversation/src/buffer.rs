//! Write-behind turn persistence.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use viva_protocols::session::{SessionPatch, SessionStatus};
use viva_protocols::turn::Turn;
use viva_protocols::{InterviewRepository, StoreError};

/// One turn that could not be persisted.
#[derive(Debug, Clone)]
pub struct TurnWriteError {
    pub turn_number: u32,
    pub error: String,
}

/// Outcome of one flush: attempted vs saved, with per-turn errors. The
/// caller decides whether to retry the remainder; failed turns stay
/// buffered.
#[derive(Debug, Default)]
pub struct FlushReport {
    pub attempted: usize,
    pub saved: usize,
    pub errors: Vec<TurnWriteError>,
}

impl FlushReport {
    /// Whether every attempted turn was persisted.
    pub fn all_saved(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Outcome of finalization.
#[derive(Debug)]
pub struct FinalizeReport {
    /// Result of flushing the remaining buffered turns.
    pub flush: FlushReport,
    /// Final session status written to the store.
    pub status: SessionStatus,
}

/// Client-side turn buffer flushed in batches.
///
/// Persistence failures never abort the live conversational loop: a
/// failed turn is reported, kept buffered, and retried on the next
/// flush. Writes are idempotent per turn number, so overlapping flushes
/// cannot duplicate turns.
pub struct TurnBuffer {
    session_id: Uuid,
    repository: Arc<dyn InterviewRepository>,
    pending: Vec<Turn>,
    flush_threshold: usize,
}

impl TurnBuffer {
    /// Create a buffer for a session.
    pub fn new(
        session_id: Uuid,
        repository: Arc<dyn InterviewRepository>,
        flush_threshold: usize,
    ) -> Self {
        Self {
            session_id,
            repository,
            pending: Vec::new(),
            flush_threshold,
        }
    }

    /// Buffer a turn. Returns true once the buffer holds at least the
    /// flush threshold, signalling the caller to flush soon.
    pub fn push(&mut self, turn: Turn) -> bool {
        self.pending.push(turn);
        self.pending.len() >= self.flush_threshold
    }

    /// Buffered turns not yet persisted.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Persist all buffered turns, isolating per-turn failures.
    pub async fn flush(&mut self) -> FlushReport {
        let pending = std::mem::take(&mut self.pending);
        let mut report = FlushReport {
            attempted: pending.len(),
            ..Default::default()
        };

        for turn in pending {
            match self.repository.create_turn(&turn).await {
                Ok(()) => report.saved += 1,
                Err(e) => {
                    warn!(
                        "Turn {} of session {} not persisted: {}",
                        turn.turn_number, self.session_id, e
                    );
                    report.errors.push(TurnWriteError {
                        turn_number: turn.turn_number,
                        error: e.to_string(),
                    });
                    self.pending.push(turn);
                }
            }
        }

        debug!(
            "Flushed session {}: {}/{} turn(s) saved",
            self.session_id, report.saved, report.attempted
        );
        report
    }

    /// Flush the remainder, write the ordered transcript, and mark the
    /// session terminal with a timestamp.
    pub async fn finalize(
        &mut self,
        status: SessionStatus,
        transcript: Vec<Turn>,
    ) -> Result<FinalizeReport, StoreError> {
        let flush = self.flush().await;
        if !flush.all_saved() {
            warn!(
                "Finalizing session {} with {} unsaved turn(s)",
                self.session_id,
                flush.errors.len()
            );
        }

        self.repository
            .update_session(self.session_id, &SessionPatch::finished(status, transcript))
            .await?;

        info!("Session {} finalized as {:?}", self.session_id, status);
        Ok(FinalizeReport { flush, status })
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
