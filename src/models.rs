use std::{fmt, str::FromStr};

use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PRODUCTS: &[&str] = &[
    "Ceramic Coffee Mug",
    "Cotton T-Shirt",
    "Hoodie",
    "Tote Bag",
    "Cap",
    "Laptop Sticker",
    "Throw Pillow",
    "Phone Case",
];

pub const STYLES: &[&str] = &[
    "Studio Lighting (Clean White Background)",
    "Lifestyle (On a wooden table in a cafe)",
    "Urban Street (Outdoor natural light)",
    "Minimalist (Soft pastel background)",
    "Industrial (Concrete background)",
];

pub const EDIT_SUGGESTIONS: &[&str] = &[
    "Add a neon glow",
    "Turn into a sketch",
    "Make it cyberpunk style",
];

/// The three screens of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Mockup,
    Editor,
    Generator,
}

impl View {
    pub const ALL: [View; 3] = [View::Mockup, View::Editor, View::Generator];

    pub fn label(self) -> &'static str {
        match self {
            View::Mockup => "Logo Mockups",
            View::Editor => "Smart Editor",
            View::Generator => "Image Gen",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            View::Mockup => "Place logo on products",
            View::Editor => "Edit images with text",
            View::Generator => "Create images from scratch",
        }
    }

    /// Prefix used for downloaded result files.
    pub fn download_prefix(self) -> &'static str {
        match self {
            View::Mockup => "mockup",
            View::Editor => "edited",
            View::Generator => "imagen",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            View::Mockup => "mockup",
            View::Editor => "editor",
            View::Generator => "generator",
        };
        f.write_str(s)
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mockup" => Ok(View::Mockup),
            "editor" => Ok(View::Editor),
            "generator" => Ok(View::Generator),
            other => Err(format!("unknown view: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "9:16")]
    Tall,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait,
        AspectRatio::Landscape,
        AspectRatio::Wide,
        AspectRatio::Tall,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Wide => "16:9",
            AspectRatio::Tall => "9:16",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectRatio::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unsupported aspect ratio: {s}"))
    }
}

/// An image held both as raw bytes and as its base64 text form.
/// Used for the user's source image and for the service's result.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub file_name: Option<String>,
    pub mime_type: String,
    pub bytes: Bytes,
    pub base64: String,
    pub created_at: DateTime<Utc>,
}

impl ImageAsset {
    pub fn new(file_name: Option<String>, mime_type: impl Into<String>, bytes: Bytes) -> Self {
        let base64 = base64::engine::general_purpose::STANDARD.encode(&bytes);
        Self { file_name, mime_type: mime_type.into(), bytes, base64, created_at: Utc::now() }
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }

    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/svg+xml" => "svg",
            _ => "png",
        }
    }

    /// `<prefix>-<unix millis>.<ext>`, e.g. `mockup-1718000000000.png`.
    pub fn download_name(&self, prefix: &str) -> String {
        format!("{}-{}.{}", prefix, self.created_at.timestamp_millis(), self.extension())
    }

    pub fn view(&self) -> AssetView {
        AssetView {
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.bytes.len(),
            data_url: self.data_url(),
        }
    }
}

/// What the render layer gets to see of an [`ImageAsset`].
#[derive(Debug, Clone, Serialize)]
pub struct AssetView {
    pub file_name: Option<String>,
    pub mime_type: String,
    pub size: usize,
    pub data_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockupParams {
    pub product: String,
    pub style: String,
    #[serde(default)]
    pub extra_instructions: String,
}

impl Default for MockupParams {
    fn default() -> Self {
        Self {
            product: PRODUCTS[0].to_string(),
            style: STYLES[0].to_string(),
            extra_instructions: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditParams {
    pub instruction: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateParams {
    pub prompt: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
}
