//! Save orchestration for gridsave.
//!
//! Every edit to a grid regenerates its document and uploads it to a
//! persistence service through a [`Transport`]. Uploads never overlap: edits
//! made while one is outstanding are folded into a single follow-up upload of
//! the newest document. When the service answers IN_PROGRESS, the submission
//! is polled at a fixed interval until it is done.
//!
//! # Architecture
//!
//! ```text
//! SaveSession (owns Grid, handles edits and completions)
//!     ├── SaveOrchestrator (synchronous state machine, no IO)
//!     └── spawned tasks: submit, PollLoop
//!           └── Transport (your persistence client)
//! ```
//!
//! The orchestrator can be driven on its own, which is how the state machine
//! is tested without a runtime:
//!
//! ```rust
//! use gridsave_sync::{Action, SaveOrchestrator, SaveState, SubmissionStatus};
//!
//! let mut orch = SaveOrchestrator::new();
//! orch.record_edit(0, "A\n1".to_string());
//!
//! let Some(Action::Submit(dispatch)) = orch.next_action() else { unreachable!() };
//! orch.record_edit(0, "A\n2".to_string());
//! assert_eq!(orch.state(), SaveState::Submitting);
//!
//! orch.on_submit_result(dispatch.ticket, Ok(SubmissionStatus::done("1")));
//! let Some(Action::Submit(follow_up)) = orch.next_action() else { unreachable!() };
//! assert_eq!(follow_up.document, "A\n2");
//! ```

pub mod error;
pub mod orchestrator;
pub mod poll;
pub mod session;
pub mod transport;

pub use error::{Result, SessionError, TransportError};
pub use orchestrator::{Action, Dispatch, SaveEvent, SaveOrchestrator, SaveState, Ticket};
pub use poll::{Completion, PollLoop, PollPolicy, PollUpdate};
pub use session::{SaveSession, SessionConfig};
pub use transport::{StatusResponse, SubmissionId, SubmissionStatus, Transport, Upload};
