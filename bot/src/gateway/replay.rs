use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::directory::InMemoryDirectory;
use crate::engine::events::PresenceEvent;
use crate::engine::rename_controller::RenameController;

/// Counters for one replay run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub dispatched: usize,
    pub malformed: usize,
}

/// Feed newline-delimited JSON notifications into the directory and the renamer.
///
/// Blank lines and lines starting with `#` are skipped. Malformed lines are logged
/// and skipped. Stops at end of input or when `cancel` fires.
pub async fn replay_events<R>(
    reader: R,
    directory: &InMemoryDirectory,
    controller: &RenameController,
    cancel: CancellationToken,
) -> Result<ReplayStats, String>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = ReplayStats::default();
    let mut line_no = 0usize;

    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("event replay interrupted");
                break;
            }
            next = lines.next_line() => match next {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => return Err(format!("Failed to read events at line {}: {e}", line_no + 1)),
            },
        };
        line_no += 1;

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let event: PresenceEvent = match serde_json::from_str(trimmed) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping malformed event");
                stats.malformed += 1;
                continue;
            }
        };

        debug!(line = line_no, event = event.kind(), "dispatching event");
        directory.apply(&event);
        controller.handle_event(&event);
        stats.dispatched += 1;
    }

    info!(
        dispatched = stats.dispatched,
        malformed = stats.malformed,
        "event replay finished"
    );
    Ok(stats)
}
