use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
    config::GeminiConfig,
    encoder,
    error::GenerationError,
    models::{AspectRatio, ImageAsset},
};

/// The three calls the screens make against the image service. Each is a
/// single attempt: no retries, no caching.
#[async_trait]
pub trait ImageGateway: Send + Sync {
    async fn compose_mockup(
        &self,
        source: &ImageAsset,
        product: &str,
        style: &str,
        extra_instructions: &str,
    ) -> Result<ImageAsset, GenerationError>;

    async fn edit_image(&self, source: &ImageAsset, instruction: &str) -> Result<ImageAsset, GenerationError>;

    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<ImageAsset, GenerationError>;
}

// Helper function to truncate base64 data in JSON for cleaner logging
fn truncate_base64_in_json(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if key == "data" || key == "bytesBase64Encoded" {
                    if let serde_json::Value::String(s) = val {
                        if s.len() > 100 && s.chars().all(|c| c.is_alphanumeric() || c == '+' || c == '/' || c == '=') {
                            *val = serde_json::Value::String(format!("{}...[truncated {} chars]", &s[..50], s.len() - 50));
                        }
                    }
                } else {
                    truncate_base64_in_json(val);
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for val in arr.iter_mut() {
                truncate_base64_in_json(val);
            }
        }
        _ => {}
    }
}

fn for_log(value: &serde_json::Value) -> String {
    let mut copy = value.clone();
    truncate_base64_in_json(&mut copy);
    copy.to_string()
}

pub fn build_mockup_prompt(product: &str, style: &str, extra_instructions: &str) -> String {
    let mut prompt = format!(
        "Generate a professional, high-quality product photography shot of a {product}. \
        The product MUST prominently feature the logo provided in the input image. \
        The logo should be realistically applied to the surface of the {product}, respecting lighting, shadows, and texture. \
        Setting: {style}."
    );
    let extra = extra_instructions.trim();
    if !extra.is_empty() {
        prompt.push_str(&format!(" Additional details: {extra}"));
    }
    prompt
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    edit_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, GenerationError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            api_key: config.api_key.clone(),
            base_url: config.api_base.clone(),
            edit_model: config.edit_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}?key={}", self.base_url, model, method, self.api_key)
    }

    async fn post_json(&self, request_id: Uuid, url: &str, body: &serde_json::Value) -> Result<String, GenerationError> {
        let redacted = if self.api_key.is_empty() { url.to_string() } else { url.replace(&self.api_key, "***") };
        info!(%request_id, "🔗 Making request to: {}", redacted);
        debug!(%request_id, "📤 Request body: {}", for_log(body));

        let response = self.client.post(url).json(body).send().await?;

        let status = response.status();
        info!(%request_id, "📥 Response status: {}", status);

        let response_text = response.text().await?;
        if !status.is_success() {
            error!(%request_id, "❌ API Error response: {}", response_text);
            return Err(GenerationError::Status { status: status.as_u16(), body: response_text });
        }
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&response_text) {
            debug!(%request_id, "📥 Raw response: {}", for_log(&value));
        }
        Ok(response_text)
    }

    async fn predict(&self, request_id: Uuid, url: &str, body: &serde_json::Value) -> Result<ImageAsset, GenerationError> {
        let response_text = self.post_json(request_id, url, body).await?;
        let parsed: PredictResponse = serde_json::from_str(&response_text)
            .map_err(|e| GenerationError::Parse(e.to_string()))?;
        let prediction = parsed
            .predictions
            .into_iter()
            .find(|p| p.bytes_base64_encoded.as_deref().is_some_and(|b| !b.is_empty()))
            .ok_or(GenerationError::NoImage)?;
        let mime = prediction.mime_type.as_deref().unwrap_or("image/jpeg");
        let data = prediction.bytes_base64_encoded.as_deref().unwrap_or_default();
        Ok(encoder::decode_base64(mime, data)?)
    }

    /// Image + text in, first inline image out.
    async fn edit_with_model(&self, source: &ImageAsset, text: &str) -> Result<ImageAsset, GenerationError> {
        let request_id = Uuid::new_v4();
        let url = self.endpoint(&self.edit_model, "generateContent");
        let body = json!({
            "contents": [{
                "parts": [
                    {"inlineData": {"data": source.base64, "mimeType": source.mime_type}},
                    {"text": text}
                ]
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE"]
            }
        });

        let response_text = self.post_json(request_id, &url, &body).await?;
        let parsed: GeminiResponse = serde_json::from_str(&response_text)
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        let inline = extract_first_image(&parsed).ok_or_else(|| {
            error!(%request_id, "⚠️ No inline image data found in response structure");
            GenerationError::NoImage
        })?;
        let mime = inline.mime_type.as_deref().filter(|m| !m.is_empty()).unwrap_or("image/png");
        let asset = encoder::decode_base64(mime, &inline.data)?;
        info!(%request_id, mime, size = asset.bytes.len(), "🖼️ Extracted image from response");
        Ok(asset)
    }
}

#[async_trait]
impl ImageGateway for GeminiClient {
    async fn compose_mockup(
        &self,
        source: &ImageAsset,
        product: &str,
        style: &str,
        extra_instructions: &str,
    ) -> Result<ImageAsset, GenerationError> {
        info!("🎯 Composing mockup: product='{}' style='{}'", product, style);
        let prompt = build_mockup_prompt(product, style, extra_instructions);
        self.edit_with_model(source, &prompt).await.inspect_err(|e| error!("Mockup generation failed: {}", e))
    }

    async fn edit_image(&self, source: &ImageAsset, instruction: &str) -> Result<ImageAsset, GenerationError> {
        let preview: String = instruction.chars().take(120).collect();
        info!("🎯 Editing image: {}", preview.trim());
        self.edit_with_model(source, instruction).await.inspect_err(|e| error!("Image editing failed: {}", e))
    }

    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<ImageAsset, GenerationError> {
        let request_id = Uuid::new_v4();
        info!(%request_id, aspect_ratio = aspect_ratio.as_str(), "🎯 Generating image");
        let url = self.endpoint(&self.image_model, "predict");
        let body = json!({
            "instances": [{"prompt": prompt}],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": aspect_ratio.as_str(),
                "outputOptions": {"mimeType": "image/jpeg"}
            }
        });

        let result = self.predict(request_id, &url, &body).await;

        match &result {
            Ok(asset) => info!(%request_id, size = asset.bytes.len(), "✅ Successfully generated image"),
            Err(e) => error!(%request_id, "Image generation failed: {}", e),
        }
        result
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate { #[serde(default)] content: Content }

#[derive(Debug, Deserialize, Default)]
struct Content { #[serde(default)] parts: Vec<Part> }

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData
    },
    #[allow(dead_code)]
    Text { text: String },
    #[allow(dead_code)]
    Other(serde_json::Value)
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(default)]
    data: String,
    #[serde(rename = "mimeType", default)]
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(rename = "bytesBase64Encoded", default)]
    bytes_base64_encoded: Option<String>,
    #[serde(rename = "mimeType", default)]
    mime_type: Option<String>,
}

fn extract_first_image(resp: &GeminiResponse) -> Option<&InlineData> {
    resp.candidates
        .iter()
        .flat_map(|c| c.content.parts.iter())
        .find_map(|p| match p {
            Part::Inline { inline_data } if !inline_data.data.is_empty() => Some(inline_data),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::png_asset;
    use axum::{
        extract::{Path, Query},
        http::StatusCode,
        routing::post,
        Json, Router,
    };
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::{collections::HashMap, sync::Arc};

    #[derive(Debug, Clone)]
    struct Received {
        call: String,
        key: Option<String>,
        body: serde_json::Value,
    }

    /// Serves one canned reply for every `/models/{model}:{method}` request
    /// and records what came in.
    async fn stub_service(status: StatusCode, reply: serde_json::Value) -> (GeminiClient, Arc<Mutex<Vec<Received>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let seen = received.clone();
        let app = Router::new().route(
            "/models/:call",
            post(
                move |Path(call): Path<String>,
                      Query(query): Query<HashMap<String, String>>,
                      Json(body): Json<serde_json::Value>| async move {
                    seen.lock().push(Received { call, key: query.get("key").cloned(), body });
                    (status, Json(reply))
                },
            ),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = GeminiClient::new(&GeminiConfig {
            api_key: "test-key".into(),
            api_base: format!("http://{addr}"),
            ..GeminiConfig::default()
        })
        .unwrap();
        (client, received)
    }

    fn only_request(received: &Mutex<Vec<Received>>) -> Received {
        let received = received.lock();
        assert_eq!(received.len(), 1);
        received[0].clone()
    }

    #[tokio::test]
    async fn edit_sends_inline_image_and_returns_first_image() {
        let (client, received) = stub_service(
            StatusCode::OK,
            json!({"candidates": [{"content": {"parts": [
                {"text": "Here you go"},
                {"inlineData": {"mimeType": "image/png", "data": "ZmFrZQ=="}}
            ]}}]}),
        )
        .await;
        let source = png_asset();

        let result = client.edit_image(&source, "add a hat").await.unwrap();
        assert_eq!(result.bytes.as_ref(), b"fake");
        assert_eq!(result.mime_type, "image/png");

        let request = only_request(&received);
        assert_eq!(request.call, "gemini-2.5-flash-image:generateContent");
        assert_eq!(request.key.as_deref(), Some("test-key"));
        let parts = &request.body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["data"], source.base64.as_str());
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["text"], "add a hat");
        assert_eq!(request.body["generationConfig"]["responseModalities"], json!(["IMAGE"]));
    }

    #[tokio::test]
    async fn mockup_reply_without_image_is_no_image() {
        let (client, received) = stub_service(
            StatusCode::OK,
            json!({"candidates": [{"content": {"parts": [{"text": "I can't do that"}]}}]}),
        )
        .await;

        let err = client.compose_mockup(&png_asset(), "Cap", "Studio", "").await.unwrap_err();
        assert!(matches!(err, GenerationError::NoImage));
        assert_eq!(err.to_string(), "no image data returned");

        let request = only_request(&received);
        let text = request.body["contents"][0]["parts"][1]["text"].as_str().unwrap();
        assert!(text.starts_with("Generate a professional, high-quality product photography shot of a Cap."));
    }

    #[tokio::test]
    async fn rejected_request_keeps_status_and_body() {
        let (client, _) = stub_service(
            StatusCode::FORBIDDEN,
            json!({"error": {"code": 403, "message": "API key not valid"}}),
        )
        .await;

        match client.edit_image(&png_asset(), "add a hat").await {
            Err(GenerationError::Status { status, body }) => {
                assert_eq!(status, 403);
                assert!(body.contains("API key not valid"));
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unexpected_response_shape_is_a_parse_error() {
        let (client, _) = stub_service(StatusCode::OK, json!("not an object")).await;
        let err = client.edit_image(&png_asset(), "add a hat").await.unwrap_err();
        assert!(matches!(err, GenerationError::Parse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn predict_requests_one_sample_at_the_chosen_ratio() {
        let (client, received) = stub_service(
            StatusCode::OK,
            json!({"predictions": [{"mimeType": "image/jpeg", "bytesBase64Encoded": "YmlrZQ=="}]}),
        )
        .await;

        let result = client.generate_image("a red bicycle", AspectRatio::Wide).await.unwrap();
        assert_eq!(result.bytes.as_ref(), b"bike");
        assert_eq!(result.mime_type, "image/jpeg");

        let request = only_request(&received);
        assert_eq!(request.call, "imagen-4.0-generate-001:predict");
        assert_eq!(request.body["instances"][0]["prompt"], "a red bicycle");
        let parameters = &request.body["parameters"];
        assert_eq!(parameters["sampleCount"], 1);
        assert_eq!(parameters["aspectRatio"], "16:9");
        assert_eq!(parameters["outputOptions"]["mimeType"], "image/jpeg");
    }

    #[tokio::test]
    async fn predict_without_bytes_is_no_image() {
        let (client, _) = stub_service(
            StatusCode::OK,
            json!({"predictions": [{"raiFilteredReason": "filtered"}]}),
        )
        .await;
        let err = client.generate_image("a red bicycle", AspectRatio::Square).await.unwrap_err();
        assert!(matches!(err, GenerationError::NoImage), "{err:?}");
    }

    #[tokio::test]
    async fn non_base64_payload_is_rejected() {
        let (client, _) = stub_service(
            StatusCode::OK,
            json!({"predictions": [{"bytesBase64Encoded": "@@@ not base64 @@@"}]}),
        )
        .await;
        let err = client.generate_image("a red bicycle", AspectRatio::Square).await.unwrap_err();
        assert!(matches!(err, GenerationError::Payload(_)), "{err:?}");
    }

    #[test]
    fn mockup_prompt_embeds_labels_and_optional_details() {
        let prompt = build_mockup_prompt("Hoodie", "Industrial (Concrete background)", "");
        assert!(prompt.starts_with("Generate a professional, high-quality product photography shot of a Hoodie."));
        assert!(prompt.contains("surface of the Hoodie"));
        assert!(prompt.ends_with("Setting: Industrial (Concrete background)."));
        assert!(!prompt.contains("Additional details"));

        let prompt = build_mockup_prompt("Cap", "Studio", "  make it blue ");
        assert!(prompt.ends_with("Additional details: make it blue"));
    }

    #[test]
    fn finds_first_inline_image_after_text_parts() {
        let resp: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Here is your mug"},
                    {"inlineData": {"mimeType": "image/png", "data": "aGk="}},
                    {"inlineData": {"mimeType": "image/png", "data": "c2Vjb25k"}}
                ]}
            }]
        }))
        .unwrap();
        let inline = extract_first_image(&resp).unwrap();
        assert_eq!(inline.data, "aGk=");
        assert_eq!(inline.mime_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn text_only_or_empty_responses_have_no_image() {
        let text_only: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "I can't do that"}]}}]
        }))
        .unwrap();
        assert!(extract_first_image(&text_only).is_none());

        let blocked: GeminiResponse = serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert!(extract_first_image(&blocked).is_none());
    }

    #[test]
    fn predict_response_without_bytes_parses() {
        let resp: PredictResponse = serde_json::from_value(json!({
            "predictions": [{"mimeType": "image/jpeg", "raiFilteredReason": "filtered"}]
        }))
        .unwrap();
        assert_eq!(resp.predictions.len(), 1);
        assert!(resp.predictions[0].bytes_base64_encoded.is_none());
    }

    #[test]
    fn truncates_long_base64_fields_only() {
        let long = "A".repeat(500);
        let mut value = json!({
            "contents": [{"parts": [{"inlineData": {"data": long, "mimeType": "image/png"}}, {"text": "hello"}]}],
            "predictions": [{"bytesBase64Encoded": "B".repeat(200)}]
        });
        truncate_base64_in_json(&mut value);
        let data = value["contents"][0]["parts"][0]["inlineData"]["data"].as_str().unwrap();
        assert!(data.ends_with("[truncated 450 chars]"));
        assert_eq!(value["contents"][0]["parts"][1]["text"], "hello");
        let bytes = value["predictions"][0]["bytesBase64Encoded"].as_str().unwrap();
        assert!(bytes.ends_with("[truncated 150 chars]"));
    }

    #[test]
    fn endpoint_includes_model_and_method() {
        let client = GeminiClient::new(&GeminiConfig {
            api_key: "k".into(),
            api_base: "http://localhost:1/v1beta".into(),
            ..GeminiConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint("imagen-4.0-generate-001", "predict"),
            "http://localhost:1/v1beta/models/imagen-4.0-generate-001:predict?key=k"
        );
    }
}
