pub mod accounts;
pub mod catalog;
pub mod correlation;
pub mod ratings;
pub mod recommendations;

pub use correlation::pearson;
pub use ratings::RatingOutcome;
pub use recommendations::{Prediction, RecommendationEngine, RecommendationError};
