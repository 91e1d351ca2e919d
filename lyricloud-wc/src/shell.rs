//! Interaction shell
//!
//! Owns the user-visible state machine and drives one pipeline run per
//! trigger: validate → fetch → normalize → render.
//!
//! ```text
//!            blank field
//!   Idle ───────────────────────────────► InputInvalid
//!    │ (or any terminal state)
//!    ▼
//!   Searching ──► Success | NotFound | Error
//! ```
//!
//! At most one run is in flight. A trigger that arrives while a run holds
//! the run guard is reported as [`TriggerOutcome::Busy`] and changes nothing.

use chrono::Utc;
use lyricloud_common::events::{EventBus, LyricloudEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::{Query, SongMatch};
use crate::services::genius_client::{FetchError, FetchOutcome, LyricsProvider};
use crate::services::normalizer::normalize;
use crate::services::renderer::{Artifact, ArtifactRenderer, RenderError, RenderOptions};

pub const INPUT_INVALID_MESSAGE: &str = "Please enter both song name and artist name.";
pub const NOT_FOUND_MESSAGE: &str = "Song not found. Please check the song name and artist.";

/// User-visible shell state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ShellState {
    Idle,
    Searching {
        query: Query,
    },
    Success {
        title: String,
        artist: String,
        words_placed: usize,
        width: u32,
        height: u32,
    },
    NotFound {
        message: String,
    },
    InputInvalid {
        message: String,
    },
    Error {
        message: String,
        /// HTTP status reported by the provider, if any
        status: Option<u16>,
    },
}

impl ShellState {
    /// Snake-case state name, as used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ShellState::Idle => "idle",
            ShellState::Searching { .. } => "searching",
            ShellState::Success { .. } => "success",
            ShellState::NotFound { .. } => "not_found",
            ShellState::InputInvalid { .. } => "input_invalid",
            ShellState::Error { .. } => "error",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ShellState::NotFound { message }
            | ShellState::InputInvalid { message }
            | ShellState::Error { message, .. } => Some(message),
            ShellState::Idle | ShellState::Searching { .. } | ShellState::Success { .. } => None,
        }
    }

    pub fn is_searching(&self) -> bool {
        matches!(self, ShellState::Searching { .. })
    }
}

/// Field values from the most recent trigger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetainedInputs {
    pub title: String,
    pub artist: String,
}

/// State plus retained inputs, as served by `GET /api/state`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellSnapshot {
    #[serde(flatten)]
    pub state: ShellState,
    pub inputs: RetainedInputs,
}

/// Result of [`Shell::trigger`]
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// The trigger ran to a terminal state
    Completed(ShellState),
    /// A run was already in flight; the trigger was ignored
    Busy,
}

enum RunFailure {
    NotFound,
    Fetch(FetchError),
    Render(RenderError),
    Task(String),
}

/// The interaction shell
pub struct Shell {
    core: Arc<ShellCore>,
    run_guard: Arc<Mutex<()>>,
}

/// State shared between the handle and the in-flight run task
struct ShellCore {
    provider: Arc<dyn LyricsProvider>,
    renderer: Arc<dyn ArtifactRenderer>,
    options: RenderOptions,
    event_bus: EventBus,
    state: RwLock<ShellState>,
    artifact: RwLock<Option<Arc<Artifact>>>,
    inputs: RwLock<RetainedInputs>,
    last_error: RwLock<Option<String>>,
}

impl Shell {
    pub fn new(
        provider: Arc<dyn LyricsProvider>,
        renderer: Arc<dyn ArtifactRenderer>,
        options: RenderOptions,
        event_bus: EventBus,
    ) -> Self {
        Self {
            core: Arc::new(ShellCore {
                provider,
                renderer,
                options,
                event_bus,
                state: RwLock::new(ShellState::Idle),
                artifact: RwLock::new(None),
                inputs: RwLock::new(RetainedInputs::default()),
                last_error: RwLock::new(None),
            }),
            run_guard: Arc::new(Mutex::new(())),
        }
    }

    pub async fn state(&self) -> ShellState {
        self.core.state.read().await.clone()
    }

    pub async fn snapshot(&self) -> ShellSnapshot {
        ShellSnapshot {
            state: self.state().await,
            inputs: self.core.inputs.read().await.clone(),
        }
    }

    /// Artifact of the last successful run, if the last run succeeded
    pub async fn artifact(&self) -> Option<Arc<Artifact>> {
        self.core.artifact.read().await.clone()
    }

    /// Message of the most recent failed run
    pub async fn last_error(&self) -> Option<String> {
        self.core.last_error.read().await.clone()
    }

    /// Run the pipeline for one title/artist pair
    ///
    /// The run executes on its own task, which holds the run guard and
    /// makes every state write. Dropping the returned future does not
    /// cancel the run; it still reaches a terminal state.
    pub async fn trigger(&self, title: &str, artist: &str) -> TriggerOutcome {
        let Ok(guard) = Arc::clone(&self.run_guard).try_lock_owned() else {
            warn!(title, artist, "Trigger ignored: a run is already in flight");
            return TriggerOutcome::Busy;
        };

        let core = Arc::clone(&self.core);
        let inputs = RetainedInputs {
            title: title.to_string(),
            artist: artist.to_string(),
        };
        let handle = tokio::spawn(async move {
            let state = core.execute(inputs).await;
            drop(guard);
            state
        });

        match handle.await {
            Ok(state) => TriggerOutcome::Completed(state),
            Err(e) => {
                error!(error = %e, "Run task failed");
                let state = ShellState::Error {
                    message: format!("Run task failed: {}", e),
                    status: None,
                };
                *self.core.last_error.write().await = state.message().map(str::to_string);
                self.core.transition(state.clone()).await;
                TriggerOutcome::Completed(state)
            }
        }
    }
}

impl ShellCore {
    /// One trigger from retained inputs to a terminal state
    async fn execute(&self, inputs: RetainedInputs) -> ShellState {
        let parsed = Query::new(&inputs.title, &inputs.artist);
        *self.inputs.write().await = inputs;

        let query = match parsed {
            Ok(query) => query,
            Err(e) => {
                debug!(reason = %e, "Rejected trigger input");
                let state = ShellState::InputInvalid {
                    message: INPUT_INVALID_MESSAGE.to_string(),
                };
                self.transition(state.clone()).await;
                return state;
            }
        };

        *self.artifact.write().await = None;
        self.transition(ShellState::Searching {
            query: query.clone(),
        })
        .await;

        let run_id = Uuid::new_v4();
        self.event_bus.emit_lossy(LyricloudEvent::GenerationStarted {
            run_id,
            title: query.title().to_string(),
            artist: query.artist().to_string(),
            timestamp: Utc::now(),
        });
        let started = Instant::now();

        let state = match self.run(&query).await {
            Ok((song, artifact)) => {
                let state = ShellState::Success {
                    title: song.title,
                    artist: song.artist,
                    words_placed: artifact.words_placed,
                    width: artifact.width(),
                    height: artifact.height(),
                };
                self.event_bus.emit_lossy(LyricloudEvent::GenerationCompleted {
                    run_id,
                    words_placed: artifact.words_placed,
                    duration_ms: started.elapsed().as_millis() as u64,
                    timestamp: Utc::now(),
                });
                *self.artifact.write().await = Some(Arc::new(artifact));
                state
            }
            Err(failure) => {
                let state = failure_state(failure);
                let reason = state.message().unwrap_or_default().to_string();
                if let ShellState::Error { message, .. } = &state {
                    *self.last_error.write().await = Some(message.clone());
                }
                self.event_bus.emit_lossy(LyricloudEvent::GenerationFailed {
                    run_id,
                    reason,
                    timestamp: Utc::now(),
                });
                state
            }
        };

        self.transition(state.clone()).await;
        state
    }

    async fn run(&self, query: &Query) -> Result<(SongMatch, Artifact), RunFailure> {
        let raw = match self.provider.search(query).await.map_err(RunFailure::Fetch)? {
            FetchOutcome::Found(raw) => raw,
            FetchOutcome::NotFound => return Err(RunFailure::NotFound),
        };
        let song = raw.song.clone();
        info!(title = %song.title, artist = %song.artist, url = %song.url, "Lyrics retrieved");

        let text = normalize(raw);
        let renderer = Arc::clone(&self.renderer);
        let options = self.options.clone();
        let artifact = tokio::task::spawn_blocking(move || renderer.render(&text, &options))
            .await
            .map_err(|e| RunFailure::Task(e.to_string()))?
            .map_err(RunFailure::Render)?;

        Ok((song, artifact))
    }

    async fn transition(&self, next: ShellState) {
        let previous = {
            let mut state = self.state.write().await;
            std::mem::replace(&mut *state, next.clone())
        };

        info!(
            from = previous.name(),
            to = next.name(),
            detail = next.message().unwrap_or(""),
            "Shell state changed"
        );
        self.event_bus.emit_lossy(LyricloudEvent::ShellStateChanged {
            state: next.name().to_string(),
            message: next.message().map(str::to_string),
            timestamp: Utc::now(),
        });
    }
}

fn failure_state(failure: RunFailure) -> ShellState {
    match failure {
        RunFailure::NotFound => ShellState::NotFound {
            message: NOT_FOUND_MESSAGE.to_string(),
        },
        RunFailure::Fetch(e) => {
            warn!(error = %e, "Lyrics fetch failed");
            ShellState::Error {
                message: format!("Failed to fetch lyrics: {}", e),
                status: e.status(),
            }
        }
        RunFailure::Render(e) => {
            warn!(error = %e, "Word cloud render failed");
            ShellState::Error {
                message: format!("Failed to render word cloud: {}", e),
                status: None,
            }
        }
        RunFailure::Task(e) => {
            warn!(error = %e, "Render task aborted");
            ShellState::Error {
                message: format!("Render task aborted: {}", e),
                status: None,
            }
        }
    }
}
