pub mod analyzer;

pub use analyzer::FoodAnalyzer;
