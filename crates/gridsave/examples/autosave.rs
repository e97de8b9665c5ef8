//! Example: edit a grid and let the session save it
//!
//! The transport here is an in-memory stand-in for a persistence service
//! that accepts every other upload immediately and makes the rest wait for
//! one status query.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gridsave::prelude::*;
use gridsave::{SubmissionId, SubmissionStatus, TransportError, Upload};

type Reply = std::result::Result<SubmissionStatus, TransportError>;

#[derive(Default)]
struct InMemoryService {
    uploads: AtomicU64,
}

impl Transport for InMemoryService {
    fn submit(
        &self,
        upload: Upload,
    ) -> impl Future<Output = Reply> + Send {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        println!("upload #{n} ({}):\n{}\n", upload.filename, upload.document);
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let body = if n % 2 == 0 {
                format!(r#"{{"status":"IN_PROGRESS","id":"{n}"}}"#)
            } else {
                format!(r#"{{"status":"DONE","id":"{n}"}}"#)
            };
            SubmissionStatus::from_json(&body)
        }
    }

    fn query_status(
        &self,
        id: &SubmissionId,
    ) -> impl Future<Output = Reply> + Send {
        let id = id.clone();
        async move { Ok(SubmissionStatus::done(id)) }
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let grid = Grid::from_strs(
        &["Item", "Price", "Qty", "Total"],
        &[&["Tea", "3", "2", "=B1*C1"], &["Cake", "4", "1", "=B2*C2"]],
    )?;

    let config = SessionConfig::default().with_poll_interval(Duration::from_millis(200));
    let mut session = SaveSession::new(grid, Arc::new(InMemoryService::default()), config);

    // Three quick edits: the first is uploaded at once, the other two are
    // folded into a single follow-up upload
    session.set_cell(0, 2, "4")?;
    session.set_cell(1, 2, "3")?;
    session.set_cell(1, 1, "5")?;

    for event in session.run_until_settled().await {
        println!("{event:?}");
    }

    println!("\nstate: {:?}", session.state());
    println!("Cake total: {}", session.display_value(1, 3));
    Ok(())
}
