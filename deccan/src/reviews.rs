//! Read-only access to the external review store.
//!
//! The core never mutates reviews; it consumes ratings and counts for
//! ranking and hands full records to the detail panel for display.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DeccanError;

/// A single user review of a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Name of the reviewed place.
    pub place: String,
    /// Numeric rating, typically `1.0..=5.0`.
    pub rating: f64,
    /// Free-form review text.
    pub text: String,
    /// Display name of the author.
    pub author_name: String,
    /// Avatar URL of the author, if any.
    pub author_photo: Option<String>,
    /// Opaque author id.
    pub author_id: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub date_ms: u64,
}

/// Aggregate rating of a place.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReviewSummary {
    /// Mean of all recorded ratings, `0.0` when there are none.
    pub avg_rating: f64,
    /// Number of recorded reviews.
    pub review_count: usize,
}

/// Computes the aggregate rating over all recorded reviews.
pub fn summarize(reviews: &[Review]) -> ReviewSummary {
    if reviews.is_empty() {
        return ReviewSummary::default();
    }

    let sum: f64 = reviews.iter().map(|review| review.rating).sum();
    ReviewSummary {
        avg_rating: sum / reviews.len() as f64,
        review_count: reviews.len(),
    }
}

/// Orders reviews for display, newest first.
pub fn sorted_for_display(mut reviews: Vec<Review>) -> Vec<Review> {
    reviews.sort_by(|a, b| b.date_ms.cmp(&a.date_ms));
    reviews
}

/// External review store seam (read interface only).
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// All recorded reviews for the place with the given name.
    async fn reviews_for(&self, place_name: &str) -> Result<Vec<Review>, DeccanError>;
}

/// A review store with no records. Used when no backend is wired up: every
/// place simply has no reviews yet.
pub struct DummyReviewStore;

#[async_trait]
impl ReviewStore for DummyReviewStore {
    async fn reviews_for(&self, _place_name: &str) -> Result<Vec<Review>, DeccanError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn review(rating: f64, date_ms: u64) -> Review {
        Review {
            place: "Fort".into(),
            rating,
            text: "".into(),
            author_name: "User".into(),
            author_photo: None,
            author_id: "u1".into(),
            date_ms,
        }
    }

    #[test]
    fn summary_is_the_mean_over_all_reviews() {
        let summary = summarize(&[review(5.0, 1), review(4.0, 2), review(3.0, 3)]);
        assert_relative_eq!(summary.avg_rating, 4.0);
        assert_eq!(summary.review_count, 3);
    }

    #[test]
    fn no_reviews_summarize_to_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.avg_rating, 0.0);
        assert_eq!(summary.review_count, 0);
    }

    #[test]
    fn display_order_is_newest_first() {
        let sorted = sorted_for_display(vec![review(5.0, 10), review(4.0, 30), review(3.0, 20)]);
        let dates: Vec<_> = sorted.iter().map(|review| review.date_ms).collect();
        assert_eq!(dates, vec![30, 20, 10]);
    }
}
