//! Test doubles shared by the controller, shell and route tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::{
    controllers::ScreenEvent,
    encoder,
    error::GenerationError,
    gemini::ImageGateway,
    models::{AspectRatio, ImageAsset},
};

pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

pub fn png_asset() -> ImageAsset {
    encoder::encode_bytes(Some("logo.png".into()), Bytes::from_static(PNG_MAGIC))
}

/// A 10KB PNG-looking upload.
pub fn png_upload() -> ImageAsset {
    let mut data = PNG_MAGIC.to_vec();
    data.resize(10 * 1024, 0);
    encoder::encode_bytes(Some("logo.png".into()), Bytes::from(data))
}

pub fn jpeg_result(tag: &'static [u8]) -> ImageAsset {
    ImageAsset::new(None, "image/jpeg", Bytes::from_static(tag))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Mockup { product: String, style: String, extra: String },
    Edit { instruction: String },
    Generate { prompt: String, aspect_ratio: AspectRatio },
}

/// Replies with scripted results in order; an empty script yields
/// `GenerationError::NoImage`.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<ImageAsset, String>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedGateway {
    pub fn replying(replies: impl IntoIterator<Item = Result<ImageAsset, String>>) -> Self {
        Self { replies: Mutex::new(replies.into_iter().collect()), calls: Mutex::default() }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn answer(&self, call: Call) -> Result<ImageAsset, GenerationError> {
        self.calls.lock().push(call);
        match self.replies.lock().pop_front() {
            Some(Ok(asset)) => Ok(asset),
            Some(Err(msg)) => Err(GenerationError::Http(msg)),
            None => Err(GenerationError::NoImage),
        }
    }
}

#[async_trait]
impl ImageGateway for ScriptedGateway {
    async fn compose_mockup(
        &self,
        _source: &ImageAsset,
        product: &str,
        style: &str,
        extra_instructions: &str,
    ) -> Result<ImageAsset, GenerationError> {
        tokio::task::yield_now().await;
        self.answer(Call::Mockup {
            product: product.into(),
            style: style.into(),
            extra: extra_instructions.into(),
        })
    }

    async fn edit_image(&self, _source: &ImageAsset, instruction: &str) -> Result<ImageAsset, GenerationError> {
        tokio::task::yield_now().await;
        self.answer(Call::Edit { instruction: instruction.into() })
    }

    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<ImageAsset, GenerationError> {
        tokio::task::yield_now().await;
        self.answer(Call::Generate { prompt: prompt.into(), aspect_ratio })
    }
}

pub fn drain(rx: &mut broadcast::Receiver<ScreenEvent>) -> Vec<ScreenEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// The `pending` flag of every change event, in order.
pub fn pending_trace(events: &[ScreenEvent]) -> Vec<bool> {
    events
        .iter()
        .filter_map(|e| match e {
            ScreenEvent::Changed { pending, .. } => Some(*pending),
            ScreenEvent::Alert { .. } => None,
        })
        .collect()
}
