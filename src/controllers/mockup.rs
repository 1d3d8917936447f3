use std::{path::Path, sync::Arc};

use super::{Outcome, Screen, ScreenEvent, Snapshot};
use crate::{
    encoder,
    error::EncodingError,
    gemini::ImageGateway,
    models::{ImageAsset, MockupParams, View},
};

pub const FAILURE: &str = "Failed to generate mockup. Please try again.";

/// Logo upload + product/style choice -> product photo mockup.
pub struct MockupController {
    screen: Screen<MockupParams>,
}

impl MockupController {
    pub fn new(gateway: Arc<dyn ImageGateway>) -> Self {
        Self { screen: Screen::new(View::Mockup, gateway) }
    }

    pub fn snapshot(&self) -> Snapshot<MockupParams> {
        self.screen.snapshot()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ScreenEvent> {
        self.screen.subscribe()
    }

    pub fn result(&self) -> Option<ImageAsset> {
        self.screen.result()
    }

    pub fn select_source(&self, logo: ImageAsset) {
        self.screen.select_source(logo);
    }

    pub fn accept_encoded(&self, encoded: Result<ImageAsset, EncodingError>) {
        self.screen.accept_encoded(encoded);
    }

    pub async fn load_file(&self, path: impl AsRef<Path>) {
        self.accept_encoded(encoder::encode_file(path).await);
    }

    pub fn set_params(&self, params: MockupParams) {
        self.screen.set_params(params);
    }

    pub fn set_product(&self, product: impl Into<String>) {
        let product = product.into();
        self.screen.update(|s| s.params.product = product);
    }

    pub fn set_style(&self, style: impl Into<String>) {
        let style = style.into();
        self.screen.update(|s| s.params.style = style);
    }

    pub fn set_extra_instructions(&self, extra: impl Into<String>) {
        let extra = extra.into();
        self.screen.update(|s| s.params.extra_instructions = extra);
    }

    pub fn dismiss_notice(&self) {
        self.screen.dismiss_notice();
    }

    /// Requires a logo.
    pub async fn generate(&self) -> Outcome {
        self.screen
            .run(
                FAILURE,
                |s| Some((s.source.clone()?, s.params.clone())),
                |gateway, (logo, params)| async move {
                    gateway
                        .compose_mockup(&logo, &params.product, &params.style, &params.extra_instructions)
                        .await
                },
            )
            .await
    }
}
