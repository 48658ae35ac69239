//! Progress notification port
//!
//! Defines the interface for reporting progress during a debate.

use mars_domain::DebatePhase;

/// Callback for progress updates during a debate
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (spinner, streamed text, etc.)
pub trait DebateProgressNotifier: Send + Sync {
    /// Called when a numbered round starts
    fn on_round_start(&self, round: u32);

    /// Called when concurrent work for a phase is dispatched
    fn on_phase_start(&self, phase: &DebatePhase, participants: &[String]);

    /// Called when every participant of a phase has settled
    fn on_phase_complete(&self, phase: &DebatePhase);

    /// Called with each complete (non-streamed) response
    fn on_response(&self, _participant: &str, _content: &str) {}

    /// Called when a participant call fails; the debate continues without it
    fn on_participant_error(&self, _participant: &str, _error: &str) {}

    /// Called when the round loop ends, with the reason
    fn on_convergence(&self, _reason: &str) {}

    // ==================== Stream Callbacks ====================

    /// Called when a participant starts streaming (verbose mode).
    fn on_stream_start(&self, _participant: &str, _phase: &DebatePhase) {}

    /// Called for each text chunk of a streaming participant.
    fn on_stream_chunk(&self, _participant: &str, _chunk: &str) {}

    /// Called when a participant's stream is drained.
    fn on_stream_end(&self, _participant: &str) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl DebateProgressNotifier for NoProgress {
    fn on_round_start(&self, _round: u32) {}
    fn on_phase_start(&self, _phase: &DebatePhase, _participants: &[String]) {}
    fn on_phase_complete(&self, _phase: &DebatePhase) {}
}
