use std::sync::Arc;

use super::{Outcome, Screen, ScreenEvent, Snapshot};
use crate::{
    gemini::ImageGateway,
    models::{AspectRatio, GenerateParams, ImageAsset, View},
};

pub const FAILURE: &str = "Failed to generate image.";

/// Text prompt + aspect ratio -> new image. This screen has no source.
pub struct GeneratorController {
    screen: Screen<GenerateParams>,
}

impl GeneratorController {
    pub fn new(gateway: Arc<dyn ImageGateway>) -> Self {
        Self { screen: Screen::new(View::Generator, gateway) }
    }

    pub fn snapshot(&self) -> Snapshot<GenerateParams> {
        self.screen.snapshot()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ScreenEvent> {
        self.screen.subscribe()
    }

    pub fn result(&self) -> Option<ImageAsset> {
        self.screen.result()
    }

    pub fn set_params(&self, params: GenerateParams) {
        self.screen.set_params(params);
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        self.screen.update(|s| s.params.prompt = prompt);
    }

    pub fn set_aspect_ratio(&self, aspect_ratio: AspectRatio) {
        self.screen.update(|s| s.params.aspect_ratio = aspect_ratio);
    }

    pub fn dismiss_notice(&self) {
        self.screen.dismiss_notice();
    }

    /// Requires a non-blank prompt. The prompt is sent as typed.
    pub async fn generate(&self) -> Outcome {
        self.screen
            .run(
                FAILURE,
                |s| (!s.params.prompt.trim().is_empty()).then(|| s.params.clone()),
                |gateway, params: GenerateParams| async move {
                    gateway.generate_image(&params.prompt, params.aspect_ratio).await
                },
            )
            .await
    }
}
