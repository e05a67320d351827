use anyhow::Result;

use crate::models::FoodImage;

/// Trait for multimodal models that turn a prompt plus one image into text
#[async_trait::async_trait]
pub trait VisionService: Send + Sync {
    /// Model identifier, shown in the web form
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str, image: &FoodImage) -> Result<String>;
}
