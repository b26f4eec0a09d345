use super::{validate_evaluation, EvaluationDraft, RatingCategory, StarRating, MAX_RATING};
use crate::error::ValidationError;

/// Evaluation screen state for one course.
///
/// A course the student already evaluated opens read-only with the stored answers.
#[derive(Debug, Clone)]
pub struct EvaluationForm {
    pub course_id: i64,
    pub draft: EvaluationDraft,
    pub view_only: bool,
    threshold: u8,
}

impl EvaluationForm {
    pub fn new(course_id: i64, threshold: u8) -> Self {
        Self {
            course_id,
            draft: EvaluationDraft::new(),
            view_only: false,
            threshold,
        }
    }

    /// Form for a course whose evaluation the server already holds
    pub fn submitted(course_id: i64, existing: EvaluationDraft, threshold: u8) -> Self {
        Self {
            course_id,
            draft: existing,
            view_only: true,
            threshold,
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn rate(&mut self, category: RatingCategory, value: u8) -> Result<(), ValidationError> {
        self.ensure_editable()?;
        if value == 0 || value > MAX_RATING {
            return Err(ValidationError::new(format!("Rating must be between 1 and {}", MAX_RATING))
                .with_field(format!("ratings.{}", category), "Out of range"));
        }
        self.draft.set_rating(category, value);
        Ok(())
    }

    pub fn comment(&mut self, category: RatingCategory, text: impl Into<String>) -> Result<(), ValidationError> {
        self.ensure_editable()?;
        self.draft.set_comment(category, text);
        Ok(())
    }

    pub fn general_comment(&mut self, text: impl Into<String>) -> Result<(), ValidationError> {
        self.ensure_editable()?;
        self.draft.set_general_comment(text);
        Ok(())
    }

    /// The comment box for this category is mandatory
    pub fn comment_required(&self, category: RatingCategory) -> bool {
        !self.view_only && self.draft.rating(category) < self.threshold
    }

    /// Star widget for one category, locked when the form is read-only
    pub fn star_rating(&self, category: RatingCategory) -> StarRating {
        StarRating::new(self.draft.rating(category), self.view_only)
    }

    /// Validate and hand back the body to post
    pub fn submission(&self) -> Result<&EvaluationDraft, ValidationError> {
        self.ensure_editable()?;
        validate_evaluation(&self.draft.ratings, &self.draft.comments, self.threshold)?;
        Ok(&self.draft)
    }

    fn ensure_editable(&self) -> Result<(), ValidationError> {
        if self.view_only {
            return Err(ValidationError::new("This course has already been evaluated"));
        }
        Ok(())
    }
}
