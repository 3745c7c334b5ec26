// src/readiness.rs

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::ExtractError;

/// Lifecycle states the remote service reports for an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Still being ingested; not yet usable as model input.
    Processing,
    /// Ready for generation requests.
    Active,
    /// Terminal; the file will never become active.
    Failed,
}

impl FileState {
    /// Map the service's SCREAMING_CASE state string. Anything that is
    /// neither active nor still processing is treated as terminal.
    pub fn from_remote(s: &str) -> Self {
        match s {
            "ACTIVE" => FileState::Active,
            "PROCESSING" => FileState::Processing,
            _ => FileState::Failed,
        }
    }
}

/// Knobs for the readiness wait.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Fixed delay between status polls.
    pub interval: Duration,
    /// Optional cap on the number of polls. `None` reproduces the
    /// historical behavior of waiting forever.
    pub max_polls: Option<u32>,
}

/// Something that can report the current state of a remote file.
/// The Gemini client implements this; tests use scripted stand-ins.
#[async_trait]
pub trait FilePoller {
    async fn poll_state(&mut self, name: &str) -> Result<FileState, ExtractError>;
}

/// Block until `name` becomes active on the remote service.
///
/// Polls immediately, then sleeps `cfg.interval` between attempts. A
/// failed file errors out on the poll that observed it, without any
/// further polling.
pub async fn wait_until_active<P: FilePoller>(
    poller: &mut P,
    name: &str,
    cfg: &PollConfig,
) -> Result<(), ExtractError> {
    let mut polls: u32 = 0;

    loop {
        let state = poller.poll_state(name).await?;
        polls += 1;

        match state {
            FileState::Active => {
                info!(file = %name, polls, "Remote file is active");
                return Ok(());
            }
            FileState::Processing => {
                debug!(file = %name, polls, "Remote file still processing");
            }
            FileState::Failed => {
                return Err(ExtractError::Processing {
                    name: name.to_string(),
                    state,
                });
            }
        }

        if let Some(max) = cfg.max_polls {
            if polls >= max {
                return Err(ExtractError::PollLimit {
                    name: name.to_string(),
                    polls,
                });
            }
        }

        tokio::time::sleep(cfg.interval).await;
    }
}
