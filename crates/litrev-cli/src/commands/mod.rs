//! One-shot service commands

mod health;
mod reviews;

pub use health::health;
pub use reviews::{delete_review, list_reviews};
