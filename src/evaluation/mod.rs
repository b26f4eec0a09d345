pub mod form;
pub mod rating;
pub mod validator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub use form::EvaluationForm;
pub use rating::StarRating;
pub use validator::{validate_evaluation, EvaluationError};

/// Highest star a category can receive
pub const MAX_RATING: u8 = 5;

/// Fixed set of aspects a student rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingCategory {
    Content,
    Materials,
    Instructor,
    Facilities,
    Support,
}

impl RatingCategory {
    pub const ALL: [RatingCategory; 5] = [
        RatingCategory::Content,
        RatingCategory::Materials,
        RatingCategory::Instructor,
        RatingCategory::Facilities,
        RatingCategory::Support,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            RatingCategory::Content => "content",
            RatingCategory::Materials => "materials",
            RatingCategory::Instructor => "instructor",
            RatingCategory::Facilities => "facilities",
            RatingCategory::Support => "support",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RatingCategory::Content => "Content",
            RatingCategory::Materials => "Materials",
            RatingCategory::Instructor => "Instructor",
            RatingCategory::Facilities => "Facilities",
            RatingCategory::Support => "Support",
        }
    }
}

impl fmt::Display for RatingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for RatingCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        RatingCategory::ALL
            .into_iter()
            .find(|c| c.key() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = RatingCategory::ALL.iter().map(|c| c.key()).collect();
                format!("unknown rating category '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// A student's in-progress ratings and comments for one course.
/// Also the body posted on submit and the shape the server returns for past submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDraft {
    #[serde(default)]
    pub ratings: BTreeMap<RatingCategory, u8>,
    #[serde(default)]
    pub comments: BTreeMap<RatingCategory, String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub general_comment: String,
}

/// Servers send `null` for a general comment that was never written
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl EvaluationDraft {
    /// Every category unset, every comment empty
    pub fn new() -> Self {
        Self {
            ratings: RatingCategory::ALL.iter().map(|c| (*c, 0)).collect(),
            comments: RatingCategory::ALL.iter().map(|c| (*c, String::new())).collect(),
            general_comment: String::new(),
        }
    }

    pub fn rating(&self, category: RatingCategory) -> u8 {
        self.ratings.get(&category).copied().unwrap_or(0)
    }

    pub fn comment(&self, category: RatingCategory) -> &str {
        self.comments.get(&category).map(String::as_str).unwrap_or("")
    }

    pub fn set_rating(&mut self, category: RatingCategory, value: u8) {
        self.ratings.insert(category, value);
    }

    pub fn set_comment(&mut self, category: RatingCategory, comment: impl Into<String>) {
        self.comments.insert(category, comment.into());
    }

    pub fn set_general_comment(&mut self, comment: impl Into<String>) {
        self.general_comment = comment.into();
    }
}

impl Default for EvaluationDraft {
    fn default() -> Self {
        Self::new()
    }
}

/// Submitted evaluation as an instructor sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: i64,
    pub student_id: String,
    pub created_at: DateTime<Utc>,
    pub ratings: BTreeMap<RatingCategory, u8>,
    #[serde(default)]
    pub comments: BTreeMap<RatingCategory, String>,
    #[serde(default)]
    pub general_comment: Option<String>,
    #[serde(default)]
    pub instructor_reply: Option<String>,
}

impl Evaluation {
    /// Category comments that were actually filled in
    pub fn non_empty_comments(&self) -> impl Iterator<Item = (RatingCategory, &str)> {
        self.comments
            .iter()
            .filter(|(_, c)| !c.trim().is_empty())
            .map(|(k, c)| (*k, c.as_str()))
    }
}
