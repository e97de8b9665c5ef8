//! The save state machine.
//!
//! [`SaveOrchestrator`] is synchronous and does no IO. It is told about edits
//! and transport results and answers with [`Action`]s for the caller to
//! execute. Observable progress is queued as [`SaveEvent`]s.
//!
//! At most one submission is in flight. Edits that arrive while one is
//! outstanding only replace the pending document, so any number of them
//! collapse into a single follow-up submission of the newest document.

use std::collections::{BTreeSet, VecDeque};

use crate::error::TransportError;
use crate::poll::PollUpdate;
use crate::transport::{SubmissionId, SubmissionStatus};

/// Identifies one dispatch within a session.
pub type Ticket = u64;

/// Externally visible save state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    /// Nothing to save.
    Idle,
    /// Edits are waiting to be dispatched.
    Pending,
    /// A submission is in flight.
    Submitting,
    /// The service accepted a submission and is being polled.
    Polling,
    /// The last save cycle failed; holds the row that was edited last.
    ErrorOnRow(usize),
}

/// A submission to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub ticket: Ticket,
    pub document: String,
    /// Row edited last when the submission was dispatched.
    pub row: usize,
}

/// Work the caller must perform on behalf of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Upload `document` and report back with
    /// [`SaveOrchestrator::on_submit_result`].
    Submit(Dispatch),
    /// Poll `id` and report every answer with
    /// [`SaveOrchestrator::on_poll_update`].
    StartPolling { ticket: Ticket, id: SubmissionId },
}

/// Observable progress of the save machinery.
#[derive(Debug)]
pub enum SaveEvent {
    /// A submission was handed to the transport.
    Dispatched { ticket: Ticket, row: usize },
    /// A submission was persisted.
    Saved {
        ticket: Ticket,
        id: Option<SubmissionId>,
    },
    /// The service accepted a submission; polling starts.
    Polling { ticket: Ticket, id: SubmissionId },
    /// A poll answered IN_PROGRESS.
    StillInProgress { ticket: Ticket, id: SubmissionId },
    /// A poll failed; polling continues.
    PollFailed {
        ticket: Ticket,
        error: TransportError,
    },
    /// The submission failed; `row` is flagged.
    Failed {
        ticket: Ticket,
        row: usize,
        error: TransportError,
    },
    /// Polling gave up after too many consecutive failures; `row` is flagged.
    PollTimedOut {
        ticket: Ticket,
        row: usize,
        attempts: u32,
    },
}

#[derive(Debug)]
struct InFlight {
    ticket: Ticket,
    document: String,
    row: usize,
}

#[derive(Debug)]
enum Phase {
    Idle,
    Submitting(InFlight),
    Polling(InFlight, SubmissionId),
}

/// Synchronous save state machine.
#[derive(Debug)]
pub struct SaveOrchestrator {
    phase: Phase,
    pending: Option<String>,
    latest: Option<String>,
    error_rows: BTreeSet<usize>,
    last_edited_row: Option<usize>,
    last_status: Option<SubmissionStatus>,
    next_ticket: Ticket,
    dispatch_count: u64,
    events: VecDeque<SaveEvent>,
}

impl Default for SaveOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveOrchestrator {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            pending: None,
            latest: None,
            error_rows: BTreeSet::new(),
            last_edited_row: None,
            last_status: None,
            next_ticket: 1,
            dispatch_count: 0,
            events: VecDeque::new(),
        }
    }

    // === Inputs ===

    /// Record an edit to `row` whose resulting document is `document`.
    ///
    /// Any edit clears every flagged row, not just `row`.
    pub fn record_edit(&mut self, row: usize, document: String) {
        self.error_rows.clear();
        self.last_edited_row = Some(row);
        self.latest = Some(document.clone());
        self.pending = Some(document);
        tracing::debug!(row, state = ?self.state(), "edit recorded");
    }

    /// Dispatch the pending document if nothing is in flight.
    ///
    /// Call after every input; the check only looks at the current state.
    pub fn next_action(&mut self) -> Option<Action> {
        if !matches!(self.phase, Phase::Idle) {
            return None;
        }
        let row = self.last_edited_row?;
        let document = self.pending.take()?;

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.dispatch_count += 1;

        self.phase = Phase::Submitting(InFlight {
            ticket,
            document: document.clone(),
            row,
        });
        self.events.push_back(SaveEvent::Dispatched { ticket, row });
        tracing::debug!(ticket, row, "dispatching");

        Some(Action::Submit(Dispatch {
            ticket,
            document,
            row,
        }))
    }

    /// Feed the result of the submission identified by `ticket`.
    pub fn on_submit_result(
        &mut self,
        ticket: Ticket,
        result: Result<SubmissionStatus, TransportError>,
    ) -> Option<Action> {
        let in_flight = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Submitting(in_flight) if in_flight.ticket == ticket => in_flight,
            other => {
                self.phase = other;
                tracing::warn!(ticket, "ignoring stale submit result");
                return None;
            }
        };

        match result {
            Ok(status) => {
                self.last_status = Some(status.clone());
                match status {
                    SubmissionStatus::Done { id, .. } => {
                        tracing::info!(ticket, "submission saved");
                        self.events.push_back(SaveEvent::Saved { ticket, id });
                        None
                    }
                    SubmissionStatus::InProgress { id } => {
                        tracing::info!(ticket, %id, "submission in progress");
                        self.phase = Phase::Polling(in_flight, id.clone());
                        self.events.push_back(SaveEvent::Polling {
                            ticket,
                            id: id.clone(),
                        });
                        Some(Action::StartPolling { ticket, id })
                    }
                }
            }
            Err(error) => {
                tracing::warn!(ticket, row = in_flight.row, %error, "submission failed");
                self.fail(in_flight.row);
                self.events.push_back(SaveEvent::Failed {
                    ticket,
                    row: in_flight.row,
                    error,
                });
                None
            }
        }
    }

    /// Feed one update from the poll loop of `ticket`.
    pub fn on_poll_update(&mut self, ticket: Ticket, update: PollUpdate) {
        let (in_flight, id) = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Polling(in_flight, id) if in_flight.ticket == ticket => (in_flight, id),
            other => {
                self.phase = other;
                tracing::warn!(ticket, "ignoring stale poll update");
                return;
            }
        };

        match update {
            PollUpdate::Status(status) => {
                self.last_status = Some(status.clone());
                if status.is_done() {
                    tracing::info!(ticket, %id, "submission saved");
                    self.events.push_back(SaveEvent::Saved {
                        ticket,
                        id: Some(id),
                    });
                } else {
                    tracing::debug!(ticket, %id, "still in progress");
                    self.events.push_back(SaveEvent::StillInProgress {
                        ticket,
                        id: id.clone(),
                    });
                    self.phase = Phase::Polling(in_flight, id);
                }
            }
            PollUpdate::Error(error) => {
                tracing::warn!(ticket, %id, %error, "status query failed");
                self.events.push_back(SaveEvent::PollFailed { ticket, error });
                self.phase = Phase::Polling(in_flight, id);
            }
            PollUpdate::TimedOut { attempts } => {
                tracing::warn!(ticket, %id, attempts, "giving up on status polling");
                self.fail(in_flight.row);
                self.events.push_back(SaveEvent::PollTimedOut {
                    ticket,
                    row: in_flight.row,
                    attempts,
                });
            }
        }
    }

    fn fail(&mut self, row: usize) {
        self.pending = None;
        self.error_rows.clear();
        self.error_rows.insert(row);
    }

    /// Take the oldest queued event.
    pub fn poll_event(&mut self) -> Option<SaveEvent> {
        self.events.pop_front()
    }

    // === Accessors ===

    pub fn state(&self) -> SaveState {
        match self.phase {
            Phase::Submitting(_) => SaveState::Submitting,
            Phase::Polling(..) => SaveState::Polling,
            Phase::Idle if self.pending.is_some() => SaveState::Pending,
            Phase::Idle => match self.error_rows.iter().next() {
                Some(&row) => SaveState::ErrorOnRow(row),
                None => SaveState::Idle,
            },
        }
    }

    /// Whether an edit is waiting to be dispatched.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether a submission or its polling is outstanding.
    pub fn is_in_flight(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// Rows flagged by the last failed save cycle.
    pub fn error_rows(&self) -> &BTreeSet<usize> {
        &self.error_rows
    }

    pub fn last_edited_row(&self) -> Option<usize> {
        self.last_edited_row
    }

    /// Newest document recorded, dispatched or not.
    pub fn latest_document(&self) -> Option<&str> {
        self.latest.as_deref()
    }

    /// Document waiting to be dispatched.
    pub fn pending_document(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Document of the submission in flight.
    pub fn running_document(&self) -> Option<&str> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Submitting(in_flight) | Phase::Polling(in_flight, _) => {
                Some(&in_flight.document)
            }
        }
    }

    /// Ticket of the submission in flight.
    pub fn in_flight_ticket(&self) -> Option<Ticket> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Submitting(in_flight) | Phase::Polling(in_flight, _) => Some(in_flight.ticket),
        }
    }

    /// Last status the service reported.
    pub fn last_status(&self) -> Option<&SubmissionStatus> {
        self.last_status.as_ref()
    }

    /// Number of submissions dispatched so far.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn submit(action: Option<Action>) -> Dispatch {
        match action {
            Some(Action::Submit(dispatch)) => dispatch,
            other => panic!("expected Submit, got {other:?}"),
        }
    }

    fn unavailable() -> TransportError {
        TransportError::Unavailable("connection refused".into())
    }

    #[test]
    fn test_idle_without_edits() {
        let mut orch = SaveOrchestrator::new();
        assert_eq!(orch.state(), SaveState::Idle);
        assert_eq!(orch.next_action(), None);
        assert!(orch.poll_event().is_none());
    }

    #[test]
    fn test_edit_then_dispatch() {
        let mut orch = SaveOrchestrator::new();
        orch.record_edit(2, "doc1".into());
        assert_eq!(orch.state(), SaveState::Pending);

        let dispatch = submit(orch.next_action());
        assert_eq!(dispatch.document, "doc1");
        assert_eq!(dispatch.row, 2);
        assert_eq!(orch.state(), SaveState::Submitting);
        assert!(!orch.is_pending());
        assert_eq!(orch.running_document(), Some("doc1"));
        assert!(matches!(
            orch.poll_event(),
            Some(SaveEvent::Dispatched { row: 2, .. })
        ));

        // Nothing else while in flight
        assert_eq!(orch.next_action(), None);
    }

    #[test]
    fn test_done_returns_to_idle() {
        let mut orch = SaveOrchestrator::new();
        orch.record_edit(0, "doc".into());
        let dispatch = submit(orch.next_action());

        let action = orch.on_submit_result(dispatch.ticket, Ok(SubmissionStatus::done("1")));
        assert_eq!(action, None);
        assert_eq!(orch.state(), SaveState::Idle);
        assert_eq!(orch.running_document(), None);
        assert_eq!(orch.last_status(), Some(&SubmissionStatus::done("1")));
    }

    #[test]
    fn test_edits_during_submit_coalesce() {
        let mut orch = SaveOrchestrator::new();
        orch.record_edit(0, "e1".into());
        let first = submit(orch.next_action());

        orch.record_edit(1, "e2".into());
        orch.record_edit(1, "e3".into());
        assert_eq!(orch.state(), SaveState::Submitting);
        assert_eq!(orch.next_action(), None);

        orch.on_submit_result(first.ticket, Ok(SubmissionStatus::done("1")));
        let second = submit(orch.next_action());
        assert_eq!(second.document, "e3");
        assert_ne!(second.ticket, first.ticket);

        orch.on_submit_result(second.ticket, Ok(SubmissionStatus::done("2")));
        assert_eq!(orch.next_action(), None);
        assert_eq!(orch.dispatch_count(), 2);
    }

    #[test]
    fn test_in_progress_starts_polling() {
        let mut orch = SaveOrchestrator::new();
        orch.record_edit(0, "doc".into());
        let dispatch = submit(orch.next_action());

        let action = orch.on_submit_result(dispatch.ticket, Ok(SubmissionStatus::in_progress("9")));
        assert_eq!(
            action,
            Some(Action::StartPolling {
                ticket: dispatch.ticket,
                id: "9".into()
            })
        );
        assert_eq!(orch.state(), SaveState::Polling);

        orch.on_poll_update(
            dispatch.ticket,
            PollUpdate::Status(SubmissionStatus::in_progress("9")),
        );
        assert_eq!(orch.state(), SaveState::Polling);

        orch.on_poll_update(dispatch.ticket, PollUpdate::Error(unavailable()));
        assert_eq!(orch.state(), SaveState::Polling);

        orch.on_poll_update(dispatch.ticket, PollUpdate::Status(SubmissionStatus::done("9")));
        assert_eq!(orch.state(), SaveState::Idle);
    }

    #[test]
    fn test_edit_during_polling_waits_for_done() {
        let mut orch = SaveOrchestrator::new();
        orch.record_edit(0, "e1".into());
        let first = submit(orch.next_action());
        orch.on_submit_result(first.ticket, Ok(SubmissionStatus::in_progress("9")));

        orch.record_edit(3, "e2".into());
        assert_eq!(orch.state(), SaveState::Polling);
        assert_eq!(orch.next_action(), None);

        orch.on_poll_update(first.ticket, PollUpdate::Status(SubmissionStatus::done("9")));
        assert_eq!(orch.state(), SaveState::Pending);
        assert_eq!(submit(orch.next_action()).document, "e2");
    }

    #[test]
    fn test_failure_flags_last_edited_row() {
        let mut orch = SaveOrchestrator::new();
        orch.record_edit(4, "doc".into());
        let dispatch = submit(orch.next_action());

        orch.on_submit_result(dispatch.ticket, Err(unavailable()));
        assert_eq!(orch.state(), SaveState::ErrorOnRow(4));
        assert_eq!(orch.error_rows().iter().copied().collect::<Vec<_>>(), vec![4]);
        assert_eq!(orch.next_action(), None);

        let events: Vec<_> = std::iter::from_fn(|| orch.poll_event()).collect();
        assert!(matches!(
            events.last(),
            Some(SaveEvent::Failed { row: 4, error: TransportError::Unavailable(_), .. })
        ));
    }

    #[test]
    fn test_failure_drops_edits_made_in_flight() {
        let mut orch = SaveOrchestrator::new();
        orch.record_edit(1, "e1".into());
        let dispatch = submit(orch.next_action());
        orch.record_edit(2, "e2".into());

        orch.on_submit_result(dispatch.ticket, Err(unavailable()));
        assert!(!orch.is_pending());
        // Row recorded at dispatch time
        assert_eq!(orch.state(), SaveState::ErrorOnRow(1));
        assert_eq!(orch.next_action(), None);
    }

    #[test]
    fn test_any_edit_clears_every_error_row() {
        let mut orch = SaveOrchestrator::new();
        orch.record_edit(4, "doc".into());
        let dispatch = submit(orch.next_action());
        orch.on_submit_result(dispatch.ticket, Err(unavailable()));

        // Editing a different row clears the flag on row 4 as well
        orch.record_edit(0, "doc2".into());
        assert!(orch.error_rows().is_empty());
        assert_eq!(orch.state(), SaveState::Pending);
    }

    #[test]
    fn test_poll_timeout_flags_row() {
        let mut orch = SaveOrchestrator::new();
        orch.record_edit(6, "doc".into());
        let dispatch = submit(orch.next_action());
        orch.on_submit_result(dispatch.ticket, Ok(SubmissionStatus::in_progress("9")));

        orch.on_poll_update(dispatch.ticket, PollUpdate::TimedOut { attempts: 5 });
        assert_eq!(orch.state(), SaveState::ErrorOnRow(6));
    }

    #[test]
    fn test_stale_results_are_ignored() {
        let mut orch = SaveOrchestrator::new();
        orch.record_edit(0, "doc".into());
        let dispatch = submit(orch.next_action());

        assert_eq!(
            orch.on_submit_result(dispatch.ticket + 1, Ok(SubmissionStatus::done("x"))),
            None
        );
        assert_eq!(orch.state(), SaveState::Submitting);

        // A poll update for a submission that is not being polled
        orch.on_poll_update(dispatch.ticket, PollUpdate::Status(SubmissionStatus::done("x")));
        assert_eq!(orch.state(), SaveState::Submitting);
        assert_eq!(orch.in_flight_ticket(), Some(dispatch.ticket));
    }
}
