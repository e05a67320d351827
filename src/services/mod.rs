pub mod gemini; // Google Gemini generateContent client
pub mod vision;

pub use gemini::GeminiService;
pub use vision::VisionService;
