//! NDJSON job loop
//!
//! The thin stand-in for the hosting serverless runtime: one JSON job
//! envelope per input line, one JSON reply per output line. Handler failures
//! and unparseable envelopes become `{"error": ...}` replies; neither kills
//! the loop. EOF ends the worker cleanly.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{error, warn};

use crate::error::Result;
use crate::server::handler::{handle_job, JobFailure, JobRequest};
use crate::server::state::WorkerState;

/// Serve jobs from stdin to stdout until EOF.
pub async fn run(state: WorkerState) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    serve(state, stdin, &mut stdout).await
}

/// Serve jobs from an arbitrary line source to an arbitrary sink.
pub async fn serve<R, W>(state: WorkerState, reader: R, writer: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<JobRequest>(line) {
            Ok(job) => {
                let id = job.id.clone();
                match handle_job(&state, job).await {
                    Ok(response) => serde_json::to_string(&response)?,
                    Err(err) => {
                        error!(%err, "job failed");
                        serde_json::to_string(&JobFailure {
                            id,
                            error: err.to_string(),
                        })?
                    }
                }
            }
            Err(err) => {
                warn!(%err, "unparseable job envelope");
                serde_json::to_string(&JobFailure {
                    id: None,
                    error: format!("invalid job envelope: {err}"),
                })?
            }
        };

        writer.write_all(reply.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
