//! Status polling for submissions the service accepted but has not finished.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;

use crate::error::TransportError;
use crate::orchestrator::Ticket;
use crate::transport::{SubmissionId, SubmissionStatus, Transport};

/// Default delay between two status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Default number of consecutive failed queries before polling gives up.
pub const DEFAULT_MAX_POLL_FAILURES: u32 = 5;

/// How often to poll and when to give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between two queries.
    pub interval: Duration,
    /// Consecutive query failures tolerated before giving up. `0` never gives up.
    pub max_failures: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_failures: DEFAULT_MAX_POLL_FAILURES,
        }
    }
}

/// One result of the poll loop.
#[derive(Debug)]
pub enum PollUpdate {
    Status(SubmissionStatus),
    Error(TransportError),
    /// Sent once, after the last tolerated failure; the loop then stops.
    TimedOut { attempts: u32 },
}

/// Message from a background task back to the session that spawned it.
#[derive(Debug)]
pub enum Completion {
    Submit {
        ticket: Ticket,
        result: Result<SubmissionStatus, TransportError>,
    },
    Poll {
        ticket: Ticket,
        update: PollUpdate,
    },
}

/// Polls one submission until it is done.
pub struct PollLoop<T> {
    transport: Arc<T>,
    ticket: Ticket,
    id: SubmissionId,
    policy: PollPolicy,
}

impl<T: Transport> PollLoop<T> {
    pub fn new(transport: Arc<T>, ticket: Ticket, id: SubmissionId, policy: PollPolicy) -> Self {
        Self {
            transport,
            ticket,
            id,
            policy,
        }
    }

    /// Query right away, then once per interval, sending every result to
    /// `sink`.
    ///
    /// Returns after a DONE answer, after giving up, or when the receiving
    /// side of `sink` is gone.
    pub async fn run(self, sink: UnboundedSender<Completion>) {
        let mut failures = 0u32;
        let mut queries = 0u32;

        loop {
            queries += 1;
            tracing::debug!(ticket = self.ticket, id = %self.id, queries, "querying status");

            let (update, done) = match self.transport.query_status(&self.id).await {
                Ok(status) => {
                    failures = 0;
                    let done = status.is_done();
                    (PollUpdate::Status(status), done)
                }
                Err(error) => {
                    failures += 1;
                    (PollUpdate::Error(error), false)
                }
            };

            if !self.send(&sink, update) || done {
                return;
            }

            if self.policy.max_failures > 0 && failures >= self.policy.max_failures {
                self.send(&sink, PollUpdate::TimedOut { attempts: failures });
                return;
            }

            sleep(self.policy.interval).await;
        }
    }

    fn send(&self, sink: &UnboundedSender<Completion>, update: PollUpdate) -> bool {
        let sent = sink
            .send(Completion::Poll {
                ticket: self.ticket,
                update,
            })
            .is_ok();
        if !sent {
            tracing::debug!(ticket = self.ticket, "session gone, stopping poll loop");
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::transport::Upload;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    /// Answers status queries from a script, recording when each one arrived.
    struct Scripted {
        answers: Mutex<VecDeque<Result<SubmissionStatus, TransportError>>>,
        queried_at: Mutex<Vec<Instant>>,
    }

    impl Scripted {
        fn new(answers: Vec<Result<SubmissionStatus, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                queried_at: Mutex::new(Vec::new()),
            })
        }
    }

    impl Transport for Scripted {
        fn submit(
            &self,
            _upload: Upload,
        ) -> impl std::future::Future<Output = Result<SubmissionStatus, TransportError>> + Send
        {
            async move { Err(TransportError::Unavailable("not scripted".into())) }
        }

        fn query_status(
            &self,
            _id: &SubmissionId,
        ) -> impl std::future::Future<Output = Result<SubmissionStatus, TransportError>> + Send
        {
            self.queried_at.lock().unwrap().push(Instant::now());
            let answer = self
                .answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Unavailable("script exhausted".into())));
            async move { answer }
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Completion>) -> Vec<PollUpdate> {
        let mut updates = Vec::new();
        while let Ok(Completion::Poll { update, .. }) = rx.try_recv() {
            updates.push(update);
        }
        updates
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_done() {
        let transport = Scripted::new(vec![
            Ok(SubmissionStatus::in_progress("1")),
            Ok(SubmissionStatus::in_progress("1")),
            Ok(SubmissionStatus::in_progress("1")),
            Ok(SubmissionStatus::done("1")),
        ]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = Instant::now();

        PollLoop::new(transport.clone(), 1, "1".into(), PollPolicy::default())
            .run(tx)
            .await;

        let updates = drain(&mut rx);
        assert_eq!(updates.len(), 4);
        assert!(matches!(updates[3], PollUpdate::Status(SubmissionStatus::Done { .. })));

        let offsets: Vec<_> = transport
            .queried_at
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.duration_since(start))
            .collect();
        assert_eq!(
            offsets,
            vec![
                Duration::ZERO,
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(15),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_consecutive_failures() {
        let transport = Scripted::new(vec![]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let policy = PollPolicy {
            interval: Duration::from_millis(100),
            max_failures: 3,
        };

        PollLoop::new(transport.clone(), 7, "1".into(), policy).run(tx).await;

        let updates = drain(&mut rx);
        assert_eq!(updates.len(), 4);
        assert!(updates[..3].iter().all(|u| matches!(u, PollUpdate::Error(_))));
        assert!(matches!(updates[3], PollUpdate::TimedOut { attempts: 3 }));
        assert_eq!(transport.queried_at.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_failure_count() {
        let unavailable = || Err(TransportError::Unavailable("flaky".into()));
        let transport = Scripted::new(vec![
            unavailable(),
            Ok(SubmissionStatus::in_progress("1")),
            unavailable(),
            Ok(SubmissionStatus::done("1")),
        ]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let policy = PollPolicy {
            interval: Duration::from_millis(100),
            max_failures: 2,
        };

        PollLoop::new(transport, 1, "1".into(), policy).run(tx).await;

        let updates = drain(&mut rx);
        assert_eq!(updates.len(), 4);
        assert!(!updates.iter().any(|u| matches!(u, PollUpdate::TimedOut { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_session_is_gone() {
        let transport = Scripted::new(vec![
            Ok(SubmissionStatus::in_progress("1")),
            Ok(SubmissionStatus::in_progress("1")),
        ]);
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        PollLoop::new(transport.clone(), 1, "1".into(), PollPolicy::default())
            .run(tx)
            .await;

        assert_eq!(transport.queried_at.lock().unwrap().len(), 1);
    }
}
