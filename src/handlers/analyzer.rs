use std::sync::Arc;

use crate::config::Credential;
use crate::models::{Analysis, FoodImage};
use crate::services::VisionService;

/// Instruction sent with every image.
pub const FOOD_PROMPT: &str = "You are an expert at analyzing images of food.\n\
Your task is to identify every food item in the image and provide its quantity.\n\
Follow these rules strictly:\n\
1.  List each item on a new line.\n\
2.  Use the format: food_item : quantity\n\
3.  If you can count an item exactly, provide the number (e.g., apple : 2).\n\
4.  If an item is in a large pile or group, provide an estimated number (e.g., \"grapes : approx. 50+\").\n\
5.  Do not identify non-food items.\n";

pub struct FoodAnalyzer {
    credential: Credential,
    vision: Arc<dyn VisionService>,
    prompt: String,
}

impl FoodAnalyzer {
    pub fn new(credential: Credential, vision: Arc<dyn VisionService>) -> Self {
        Self {
            credential,
            vision,
            prompt: FOOD_PROMPT.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn model(&self) -> &str {
        self.vision.model()
    }

    /// Identify the food in `image`. Never fails: a missing API key and
    /// remote errors come back as `Analysis` variants.
    pub async fn analyze(&self, image: &FoodImage) -> Analysis {
        if !self.credential.is_present() {
            log::warn!("⚠️ GEMINI_API_KEY is not set, skipping analysis");
            return Analysis::MissingCredential;
        }

        log::info!("🍽️ Analyzing {}x{} image", image.width(), image.height());

        // Only suspension point; unbounded unless GEMINI_TIMEOUT_SECS is set.
        match self.vision.generate(&self.prompt, image).await {
            Ok(text) => {
                log::info!("✅ Analysis completed");
                Analysis::Completed(text)
            }
            Err(e) => {
                log::error!("❌ Analysis failed: {:#}", e);
                Analysis::Failed(format!("{:#}", e))
            }
        }
    }
}
