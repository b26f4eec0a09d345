use std::collections::BTreeMap;
use thiserror::Error;

use super::{RatingCategory, MAX_RATING};
use crate::error::ValidationError;

/// Why an evaluation cannot be submitted yet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("Please rate every category")]
    IncompleteRatings { unrated: Vec<RatingCategory> },

    #[error("Please add a comment for every category rated below {threshold} stars")]
    MissingRequiredComment {
        categories: Vec<RatingCategory>,
        threshold: u8,
    },

    #[error("Rating for {category} must be between 1 and {max}", max = MAX_RATING)]
    RatingOutOfRange { category: RatingCategory, value: u8 },
}

/// Check a submission over the fixed category set.
///
/// Missing ratings are reported before missing comments; a category absent
/// from `ratings` counts as unrated.
pub fn validate_evaluation(
    ratings: &BTreeMap<RatingCategory, u8>,
    comments: &BTreeMap<RatingCategory, String>,
    threshold: u8,
) -> Result<(), EvaluationError> {
    let rating_of = |c: &RatingCategory| ratings.get(c).copied().unwrap_or(0);

    if let Some(category) = RatingCategory::ALL.into_iter().find(|c| rating_of(c) > MAX_RATING) {
        return Err(EvaluationError::RatingOutOfRange {
            category,
            value: rating_of(&category),
        });
    }

    let unrated: Vec<_> = RatingCategory::ALL
        .into_iter()
        .filter(|c| rating_of(c) == 0)
        .collect();
    if !unrated.is_empty() {
        return Err(EvaluationError::IncompleteRatings { unrated });
    }

    let uncommented: Vec<_> = RatingCategory::ALL
        .into_iter()
        .filter(|c| rating_of(c) < threshold)
        .filter(|c| comments.get(c).map_or(true, |text| text.trim().is_empty()))
        .collect();
    if !uncommented.is_empty() {
        return Err(EvaluationError::MissingRequiredComment {
            categories: uncommented,
            threshold,
        });
    }

    Ok(())
}

impl From<EvaluationError> for ValidationError {
    fn from(err: EvaluationError) -> Self {
        let message = err.to_string();
        match err {
            EvaluationError::IncompleteRatings { unrated } => unrated
                .into_iter()
                .fold(ValidationError::new(message), |acc, c| {
                    acc.with_field(format!("ratings.{}", c), "Rating is required")
                }),
            EvaluationError::MissingRequiredComment { categories, .. } => categories
                .into_iter()
                .fold(ValidationError::new(message), |acc, c| {
                    acc.with_field(format!("comments.{}", c), "Comment is required for low ratings")
                }),
            EvaluationError::RatingOutOfRange { category, .. } => ValidationError::new(message)
                .with_field(format!("ratings.{}", category), "Rating must be between 1 and 5"),
        }
    }
}
