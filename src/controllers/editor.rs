use std::{path::Path, sync::Arc};

use tracing::info;

use super::{Outcome, Screen, ScreenEvent, Snapshot};
use crate::{
    encoder,
    error::EncodingError,
    gemini::ImageGateway,
    models::{EditParams, ImageAsset, View, EDIT_SUGGESTIONS},
};

pub const FAILURE: &str = "Failed to edit image.";

/// Natural-language edits of an uploaded image, chainable by feeding the
/// result back in as the next source.
pub struct EditorController {
    screen: Screen<EditParams>,
}

impl EditorController {
    pub fn new(gateway: Arc<dyn ImageGateway>) -> Self {
        Self { screen: Screen::new(View::Editor, gateway) }
    }

    pub fn snapshot(&self) -> Snapshot<EditParams> {
        self.screen.snapshot()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ScreenEvent> {
        self.screen.subscribe()
    }

    pub fn result(&self) -> Option<ImageAsset> {
        self.screen.result()
    }

    pub fn select_source(&self, image: ImageAsset) {
        self.screen.select_source(image);
    }

    pub fn accept_encoded(&self, encoded: Result<ImageAsset, EncodingError>) {
        self.screen.accept_encoded(encoded);
    }

    pub async fn load_file(&self, path: impl AsRef<Path>) {
        self.accept_encoded(encoder::encode_file(path).await);
    }

    pub fn set_instruction(&self, instruction: impl Into<String>) {
        self.screen.set_params(EditParams { instruction: instruction.into() });
    }

    /// Fills the instruction with one of the canned suggestions. Returns
    /// false for an unknown index.
    pub fn apply_suggestion(&self, index: usize) -> bool {
        match EDIT_SUGGESTIONS.get(index) {
            Some(text) => {
                self.set_instruction(*text);
                true
            }
            None => false,
        }
    }

    pub fn dismiss_notice(&self) {
        self.screen.dismiss_notice();
    }

    /// Requires an image and a non-blank instruction.
    pub async fn edit(&self) -> Outcome {
        self.screen
            .run(
                FAILURE,
                |s| {
                    let image = s.source.clone()?;
                    let instruction = s.params.instruction.clone();
                    (!instruction.trim().is_empty()).then_some((image, instruction))
                },
                |gateway, (image, instruction)| async move { gateway.edit_image(&image, &instruction).await },
            )
            .await
    }

    /// Enter in the instruction field submits; other keys do nothing.
    pub async fn key_press(&self, key: &str) -> Outcome {
        if key == "Enter" {
            self.edit().await
        } else {
            Outcome::Ignored
        }
    }

    pub fn reset(&self) {
        self.screen.update(|s| {
            s.source = None;
            s.result = None;
            s.params = EditParams::default();
        });
    }

    /// Makes the current result the new source, then clears the result and
    /// the instruction. Returns false when there is no result to promote.
    pub fn use_result_as_source(&self) -> bool {
        let promoted = self.screen.update(|s| match s.result.clone() {
            Some(result) => {
                s.source = Some(result);
                s.result = None;
                s.params.instruction.clear();
                true
            }
            None => false,
        });
        if promoted {
            info!("result promoted to editor source");
        }
        promoted
    }
}
