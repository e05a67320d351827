use anyhow::{Context, Result};
use image::{DynamicImage, ImageOutputFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::Arc;

/// Returned instead of an analysis when no API key was configured.
pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "ERROR: Gemini API Key is not set. Please set the GEMINI_API_KEY environment variable.";

const JPEG_QUALITY: u8 = 85;

/// A decoded upload, held in memory for the duration of one request.
/// Cloning shares the bitmap.
#[derive(Debug, Clone)]
pub struct FoodImage {
    inner: Arc<DynamicImage>,
}

impl FoodImage {
    /// Decode raw upload bytes (JPEG, PNG, WebP, GIF, ...) into a bitmap.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let inner = image::load_from_memory(bytes).context("Unsupported or corrupt image")?;
        Ok(Self::from(inner))
    }

    /// Decode on the blocking pool so large uploads don't stall the runtime.
    pub async fn decode<B>(bytes: B) -> Result<Self>
    where
        B: AsRef<[u8]> + Send + 'static,
    {
        tokio::task::spawn_blocking(move || Self::from_bytes(bytes.as_ref()))
            .await
            .context("Image decode task failed")?
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// Re-encode as an RGB JPEG for transport. Alpha is dropped.
    pub fn to_jpeg(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(self.inner.to_rgb8())
            .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Jpeg(JPEG_QUALITY))
            .context("Failed to encode image as JPEG")?;
        Ok(buf)
    }

    /// `to_jpeg` on the blocking pool.
    pub async fn encode_jpeg(&self) -> Result<Vec<u8>> {
        let image = self.clone();
        tokio::task::spawn_blocking(move || image.to_jpeg())
            .await
            .context("JPEG encode task failed")?
    }
}

impl From<DynamicImage> for FoodImage {
    fn from(inner: DynamicImage) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

/// Outcome of a single analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Analysis {
    /// Text returned by the model, untouched.
    Completed(String),
    /// No API key configured; no request was made.
    MissingCredential,
    /// The remote call failed; holds the error detail.
    Failed(String),
}

impl Analysis {
    pub fn status(&self) -> &'static str {
        match self {
            Analysis::Completed(_) => "completed",
            Analysis::MissingCredential => "missing_credential",
            Analysis::Failed(_) => "failed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Analysis::Completed(_))
    }
}

impl std::fmt::Display for Analysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Analysis::Completed(text) => write!(f, "{}", text),
            Analysis::MissingCredential => write!(f, "{}", MISSING_CREDENTIAL_MESSAGE),
            Analysis::Failed(detail) => write!(f, "An error occurred: {}", detail),
        }
    }
}

/// One `food_item : quantity` line from a completed analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub quantity: String,
}

/// Best-effort split of the model's reply into items. Lines that don't look
/// like `name : quantity` are skipped; nothing is validated.
pub fn parse_food_items(text: &str) -> Vec<FoodItem> {
    text.lines()
        .filter_map(|line| {
            let line = line
                .trim()
                .trim_start_matches(|c: char| c == '-' || c == '*' || c == '•')
                .trim();
            let (name, quantity) = line.split_once(':')?;
            let name = name.trim().trim_matches('*').trim();
            let quantity = quantity.trim().trim_matches('*').trim();

            if name.is_empty() || quantity.is_empty() {
                return None;
            }

            Some(FoodItem {
                name: name.to_string(),
                quantity: quantity.to_string(),
            })
        })
        .collect()
}
