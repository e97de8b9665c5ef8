//! The save session: one grid, its save state, and the tasks talking to the
//! persistence service on its behalf.

use std::sync::Arc;
use std::time::Duration;

use gridsave_core::{CellAddress, CellText, Grid};
use gridsave_csv::{DocumentWriter, DOCUMENT_CONTENT_TYPE, DOCUMENT_FILENAME};
use gridsave_formula::{evaluate_cell, referenced_cells};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::Result;
use crate::orchestrator::{Action, Dispatch, SaveEvent, SaveOrchestrator, SaveState};
use crate::poll::{
    Completion, PollLoop, PollPolicy, DEFAULT_MAX_POLL_FAILURES, DEFAULT_POLL_INTERVAL,
};
use crate::transport::{SubmissionStatus, Transport, Upload};

/// Configuration for a [`SaveSession`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay between status queries. Default: 5 seconds.
    pub poll_interval: Duration,
    /// Consecutive failed status queries before giving up (`0` never gives
    /// up). Default: 5.
    pub max_poll_failures: u32,
    /// File name of the uploaded document. Default: `data.csv`.
    pub filename: String,
    /// Content type of the uploaded document. Default: `text/csv`.
    pub content_type: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_failures: DEFAULT_MAX_POLL_FAILURES,
            filename: DOCUMENT_FILENAME.to_string(),
            content_type: DOCUMENT_CONTENT_TYPE.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_poll_failures(mut self, max: u32) -> Self {
        self.max_poll_failures = max;
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.poll_interval,
            max_failures: self.max_poll_failures,
        }
    }
}

/// An editable grid that saves itself.
///
/// Every change made through [`set_cell`](Self::set_cell) regenerates the
/// document and, when no save is outstanding, dispatches it right away on a
/// spawned Tokio task. Results come back over a channel and are applied when
/// the owner calls [`next_event`](Self::next_event), so all state changes
/// happen on the owner's `&mut self`.
///
/// Edits require a Tokio runtime, since dispatching spawns tasks.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use gridsave_core::Grid;
/// use gridsave_sync::{SaveSession, SessionConfig, Transport};
///
/// async fn edit<T: Transport>(transport: Arc<T>) -> gridsave_sync::Result<()> {
///     let grid = Grid::from_strs(&["A", "B"], &[&["1", "=A1*2"]])?;
///     let mut session = SaveSession::new(grid, transport, SessionConfig::default());
///
///     session.set_cell(0, 0, "5")?;
///     for event in session.run_until_settled().await {
///         println!("{event:?}");
///     }
///     assert_eq!(session.display_value(0, 1), "10");
///     Ok(())
/// }
/// ```
pub struct SaveSession<T: Transport> {
    grid: Grid,
    orchestrator: SaveOrchestrator,
    transport: Arc<T>,
    config: SessionConfig,
    focused: Option<CellAddress>,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
}

impl<T: Transport> SaveSession<T> {
    pub fn new(grid: Grid, transport: Arc<T>, config: SessionConfig) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            grid,
            orchestrator: SaveOrchestrator::new(),
            transport,
            config,
            focused: None,
            completions_tx,
            completions_rx,
        }
    }

    // === Editing ===

    /// Replace the text of one cell and schedule a save.
    ///
    /// Returns `Ok(false)` without touching the save state when the text is
    /// unchanged.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) -> Result<bool> {
        if !self.grid.set_cell(row, col, value)? {
            return Ok(false);
        }

        let document = DocumentWriter::to_document(&self.grid);
        self.orchestrator.record_edit(row, document);
        self.dispatch_if_free();
        Ok(true)
    }

    // === Driving ===

    /// Wait for the next save event.
    ///
    /// Returns `None` once nothing is in flight and no event is queued.
    /// Cancel safe: dropping the future loses no completion.
    pub async fn next_event(&mut self) -> Option<SaveEvent> {
        loop {
            if let Some(event) = self.orchestrator.poll_event() {
                return Some(event);
            }
            if !self.orchestrator.is_in_flight() {
                return None;
            }
            // The session holds a sender, so the channel never closes here
            let completion = self.completions_rx.recv().await?;
            self.apply(completion);
        }
    }

    /// Drive the session until every edit has been saved or has failed.
    pub async fn run_until_settled(&mut self) -> Vec<SaveEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            events.push(event);
        }
        events
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Submit { ticket, result } => {
                if let Some(action) = self.orchestrator.on_submit_result(ticket, result) {
                    self.execute(action);
                }
            }
            Completion::Poll { ticket, update } => {
                self.orchestrator.on_poll_update(ticket, update);
            }
        }
        self.dispatch_if_free();
    }

    fn dispatch_if_free(&mut self) {
        if let Some(action) = self.orchestrator.next_action() {
            self.execute(action);
        }
    }

    fn execute(&self, action: Action) {
        match action {
            Action::Submit(Dispatch {
                ticket, document, ..
            }) => {
                let upload = Upload {
                    document,
                    filename: self.config.filename.clone(),
                    content_type: self.config.content_type.clone(),
                };
                let transport = Arc::clone(&self.transport);
                let sink = self.completions_tx.clone();

                tracing::info!(ticket, bytes = upload.document.len(), "submitting document");
                tokio::spawn(async move {
                    let result = transport.submit(upload).await;
                    if sink.send(Completion::Submit { ticket, result }).is_err() {
                        tracing::debug!(ticket, "session gone, dropping submit result");
                    }
                });
            }
            Action::StartPolling { ticket, id } => {
                let poll = PollLoop::new(
                    Arc::clone(&self.transport),
                    ticket,
                    id,
                    self.config.poll_policy(),
                );
                tokio::spawn(poll.run(self.completions_tx.clone()));
            }
        }
    }

    // === Focus ===

    /// Focus a cell; its formula's references become highlighted.
    pub fn focus(&mut self, row: usize, col: usize) {
        self.focused = Some(CellAddress::new(row, col));
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    pub fn focused_cell(&self) -> Option<CellAddress> {
        self.focused
    }

    /// Cells referenced by the focused cell's formula, in order of appearance.
    pub fn highlighted_cells(&self) -> Vec<CellAddress> {
        let Some(focus) = self.focused else {
            return Vec::new();
        };
        match self.grid.cell_text(focus.row, focus.col) {
            Some(CellText::Formula(body)) => referenced_cells(body),
            _ => Vec::new(),
        }
    }

    // === Accessors ===

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &SaveOrchestrator {
        &self.orchestrator
    }

    pub fn state(&self) -> SaveState {
        self.orchestrator.state()
    }

    pub fn error_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.orchestrator.error_rows().iter().copied()
    }

    /// Whether `row` is flagged by the last failed save.
    pub fn is_error_row(&self, row: usize) -> bool {
        self.orchestrator.error_rows().contains(&row)
    }

    /// Newest document, dispatched or not.
    pub fn latest_document(&self) -> Option<&str> {
        self.orchestrator.latest_document()
    }

    /// Document of the submission in flight.
    pub fn running_document(&self) -> Option<&str> {
        self.orchestrator.running_document()
    }

    /// Document waiting behind the running one, if it differs from it.
    pub fn scheduled_document(&self) -> Option<&str> {
        let pending = self.orchestrator.pending_document()?;
        if self.running_document() == Some(pending) {
            None
        } else {
            Some(pending)
        }
    }

    pub fn last_status(&self) -> Option<&SubmissionStatus> {
        self.orchestrator.last_status()
    }

    /// Evaluated value of one cell, as displayed and saved.
    pub fn display_value(&self, row: usize, col: usize) -> String {
        evaluate_cell(&self.grid, row, col)
    }
}
