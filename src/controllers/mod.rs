//! Per-screen interaction state and the request lifecycle shared by all
//! three screens: idle -> pending -> succeeded | failed.

mod editor;
mod generator;
mod mockup;

pub use editor::EditorController;
pub use generator::GeneratorController;
pub use mockup::MockupController;

use std::{future::Future, sync::Arc};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::{
    error::{EncodingError, GenerationError},
    gemini::ImageGateway,
    models::{AssetView, ImageAsset, View},
};

const EVENT_CAPACITY: usize = 64;

pub const READ_FAILURE: &str = "Failed to read image file.";

/// What happened to a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Preconditions unmet; nothing changed.
    Ignored,
    /// A request for this screen is already in flight.
    Busy,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScreenEvent {
    Changed { view: View, revision: u64, pending: bool },
    /// A failure the user has to acknowledge.
    Alert { view: View, message: String },
}

#[derive(Debug, Clone)]
pub struct ScreenState<P> {
    pub source: Option<ImageAsset>,
    pub params: P,
    pub pending: bool,
    pub result: Option<ImageAsset>,
    pub notice: Option<String>,
    pub revision: u64,
}

/// Read-only copy handed to the render layer.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<P> {
    pub view: View,
    pub source: Option<AssetView>,
    pub params: P,
    pub pending: bool,
    pub result: Option<AssetView>,
    pub notice: Option<String>,
    pub revision: u64,
}

/// State plus change notification for one screen.
pub struct Screen<P> {
    shared: Arc<Shared<P>>,
    gateway: Arc<dyn ImageGateway>,
}

/// The part of a screen a spawned request writes back into.
struct Shared<P> {
    view: View,
    state: Mutex<ScreenState<P>>,
    events: broadcast::Sender<ScreenEvent>,
}

impl<P> Shared<P> {
    fn update<R>(&self, edit: impl FnOnce(&mut ScreenState<P>) -> R) -> R {
        let mut state = self.state.lock();
        let out = edit(&mut state);
        self.bump(&mut state);
        out
    }

    fn bump(&self, state: &mut ScreenState<P>) {
        state.revision += 1;
        let _ = self.events.send(ScreenEvent::Changed {
            view: self.view,
            revision: state.revision,
            pending: state.pending,
        });
    }

    /// Sets the notice and, in the same transition, clears `pending`.
    fn alert(&self, message: &str) {
        self.update(|s| {
            s.pending = false;
            s.notice = Some(message.to_string());
        });
        let _ = self.events.send(ScreenEvent::Alert { view: self.view, message: message.to_string() });
    }

    fn finish(&self, outcome: Result<ImageAsset, GenerationError>, failure_message: &str) -> Outcome {
        match outcome {
            Ok(asset) => {
                info!(view = %self.view, size = asset.bytes.len(), "request succeeded");
                self.update(|s| {
                    s.result = Some(asset);
                    s.pending = false;
                });
                Outcome::Succeeded
            }
            Err(e) => {
                error!(view = %self.view, "request failed: {}", e);
                self.alert(failure_message);
                Outcome::Failed
            }
        }
    }
}

impl<P: Clone + Default + Send + 'static> Screen<P> {
    pub fn new(view: View, gateway: Arc<dyn ImageGateway>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                view,
                state: Mutex::new(ScreenState {
                    source: None,
                    params: P::default(),
                    pending: false,
                    result: None,
                    notice: None,
                    revision: 0,
                }),
                events,
            }),
            gateway,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScreenEvent> {
        self.shared.events.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot<P> {
        let state = self.shared.state.lock();
        Snapshot {
            view: self.shared.view,
            source: state.source.as_ref().map(ImageAsset::view),
            params: state.params.clone(),
            pending: state.pending,
            result: state.result.as_ref().map(ImageAsset::view),
            notice: state.notice.clone(),
            revision: state.revision,
        }
    }

    pub fn result(&self) -> Option<ImageAsset> {
        self.shared.state.lock().result.clone()
    }

    /// Applies a user edit and notifies subscribers.
    pub(crate) fn update<R>(&self, edit: impl FnOnce(&mut ScreenState<P>) -> R) -> R {
        self.shared.update(edit)
    }

    pub fn set_params(&self, params: P) {
        self.update(|s| s.params = params);
    }

    pub fn dismiss_notice(&self) {
        self.update(|s| s.notice = None);
    }

    /// A new source always clears the previous result.
    pub fn select_source(&self, asset: ImageAsset) {
        info!(view = %self.shared.view, mime = %asset.mime_type, size = asset.bytes.len(), "source selected");
        self.update(|s| {
            s.source = Some(asset);
            s.result = None;
        });
    }

    /// Takes the outcome of an encode; a failure becomes a notice.
    pub fn accept_encoded(&self, encoded: Result<ImageAsset, EncodingError>) {
        match encoded {
            Ok(asset) => self.select_source(asset),
            Err(e) => {
                error!(view = %self.shared.view, "failed to encode source: {}", e);
                self.shared.alert(READ_FAILURE);
            }
        }
    }

    /// Runs one gateway call through the pending lifecycle.
    ///
    /// `prepare` checks preconditions against the current state and returns
    /// the inputs for the call, or `None` to make the trigger a no-op. The
    /// guard check and the switch to pending happen under one lock.
    ///
    /// The call and the write-back of its outcome run on a spawned task, so
    /// a request finishes and clears `pending` even if the caller stops
    /// waiting.
    pub async fn run<J, F, Fut>(
        &self,
        failure_message: &'static str,
        prepare: impl FnOnce(&ScreenState<P>) -> Option<J>,
        call: F,
    ) -> Outcome
    where
        J: Send + 'static,
        F: FnOnce(Arc<dyn ImageGateway>, J) -> Fut + Send + 'static,
        Fut: Future<Output = Result<ImageAsset, GenerationError>> + Send + 'static,
    {
        let job = {
            let mut state = self.shared.state.lock();
            if state.pending {
                warn!(view = %self.shared.view, "request already in flight, trigger ignored");
                return Outcome::Busy;
            }
            let Some(job) = prepare(&state) else {
                return Outcome::Ignored;
            };
            state.pending = true;
            state.notice = None;
            self.shared.bump(&mut state);
            job
        };

        let shared = self.shared.clone();
        let gateway = self.gateway.clone();
        let task = tokio::spawn(async move {
            let outcome = call(gateway, job).await;
            shared.finish(outcome, failure_message)
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(view = %self.shared.view, "request task aborted: {}", e);
                self.shared.alert(failure_message);
                Outcome::Failed
            }
        }
    }
}
