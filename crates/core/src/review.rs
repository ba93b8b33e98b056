//! Reviewer-side assignment handling.
//!
//! Like validated values, `suggestion_values` is replaced wholesale on
//! every update, so each builder returns the complete list.

use serde::{Deserialize, Serialize};

use crate::category::NO_DATA_CODE;
use crate::error::CoreError;
use crate::model::{AdministrationId, InitialValue, SuggestionValue, UserId};

/// Publication summary embedded in a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationInfo {
    pub id: i64,
    #[serde(default)]
    pub year_month: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub initial_values: Vec<InitialValue>,
    #[serde(default)]
    pub status: Option<i32>,
}

/// Response of `GET /reviewer/review/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewAssignment {
    pub id: i64,
    #[serde(default)]
    pub publication_id: Option<i64>,
    #[serde(default)]
    pub publication: Option<PublicationInfo>,
    pub user_id: UserId,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub suggestion_values: Option<Vec<SuggestionValue>>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub progress_review: Option<String>,
}

impl ReviewAssignment {
    /// Fields handed to capability checks: the review plus an `owner`
    /// flag relative to `user`.
    pub fn subject_fields(&self, user: UserId) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "user_id": self.user_id,
            "owner": self.user_id == user,
        })
    }

    pub fn progress(&self) -> ReviewProgress {
        let stored = self.progress_review.as_deref().and_then(|s| ReviewProgress::parse(s).ok());
        if let Some(p) = stored {
            return p;
        }
        let values = working_values(self);
        ReviewProgress::of(&values, values.len())
    }
}

/// "reviewed/total" counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewProgress {
    pub reviewed: usize,
    pub total: usize,
}

impl ReviewProgress {
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let (reviewed, total) = s
            .split_once('/')
            .ok_or_else(|| CoreError::Progress(s.to_string()))?;
        let parse = |v: &str| {
            v.trim().parse::<usize>().map_err(|_| CoreError::Progress(s.to_string()))
        };
        Ok(Self { reviewed: parse(reviewed)?, total: parse(total)? })
    }

    pub fn of(values: &[SuggestionValue], total: usize) -> Self {
        Self { reviewed: values.iter().filter(|v| v.reviewed).count(), total }
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.reviewed)
    }

    /// All regions reviewed, and there was at least one.
    pub fn is_done(&self) -> bool {
        self.total > 0 && self.remaining() == 0
    }
}

impl std::fmt::Display for ReviewProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.reviewed, self.total)
    }
}

/// Current suggestion list, or the publication's initial values when the
/// reviewer has not saved anything yet.
pub fn working_values(review: &ReviewAssignment) -> Vec<SuggestionValue> {
    saved_or_initial(review.suggestion_values.as_deref(), review.publication.as_ref())
}

pub(crate) fn saved_or_initial(
    saved: Option<&[SuggestionValue]>,
    publication: Option<&PublicationInfo>,
) -> Vec<SuggestionValue> {
    match saved {
        Some(values) if !values.is_empty() => values.to_vec(),
        _ => publication
            .map(|p| p.initial_values.iter().map(SuggestionValue::from).collect())
            .unwrap_or_default(),
    }
}

/// Record a reviewer's decision for one region.
///
/// Without `category` the region keeps its current value, which approves
/// it as-is; a region without a usable value (none or No Data) needs a
/// suggestion instead. A category other than the current one needs a
/// non-blank comment. Reviewed regions can be revised while the review is
/// open.
pub fn suggest(
    base: &[SuggestionValue],
    target: AdministrationId,
    category: Option<i32>,
    comment: Option<String>,
) -> Result<Vec<SuggestionValue>, CoreError> {
    let current = base
        .iter()
        .find(|v| v.administration_id == target)
        .ok_or(CoreError::UnknownRegion(target))?;
    if category.is_none() && !has_usable_category(current) {
        return Err(CoreError::SuggestionRequired(target));
    }
    let comment = comment.filter(|c| !c.trim().is_empty());
    let changed = category.is_some_and(|c| Some(c) != current.category);
    if changed && comment.is_none() {
        return Err(CoreError::CommentRequired(target));
    }

    Ok(base
        .iter()
        .map(|v| {
            if v.administration_id != target {
                return v.clone();
            }
            SuggestionValue {
                category: category.or(v.category),
                comment: comment.clone().or_else(|| v.comment.clone()),
                reviewed: true,
                ..v.clone()
            }
        })
        .collect())
}

fn has_usable_category(value: &SuggestionValue) -> bool {
    value.category.is_some_and(|c| c != NO_DATA_CODE)
}

/// Flag regions as reviewed without changing their categories.
///
/// Every id must be in `base` and carry a usable category.
pub fn mark_reviewed(
    base: &[SuggestionValue],
    ids: &[AdministrationId],
) -> Result<Vec<SuggestionValue>, CoreError> {
    for id in ids {
        let current = base
            .iter()
            .find(|v| v.administration_id == *id)
            .ok_or(CoreError::UnknownRegion(*id))?;
        if !has_usable_category(current) {
            return Err(CoreError::SuggestionRequired(*id));
        }
    }
    Ok(base
        .iter()
        .map(|v| SuggestionValue {
            reviewed: v.reviewed || ids.contains(&v.administration_id),
            ..v.clone()
        })
        .collect())
}

/// Body of `PUT /reviewer/review/{id}` for suggestion edits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionUpdate {
    pub suggestion_values: Vec<SuggestionValue>,
}

/// Body of `PUT /reviewer/review/{id}` submitting the review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewCompletion {
    pub is_completed: bool,
    pub completed_at: String,
}

impl ReviewCompletion {
    pub fn at(time: chrono::NaiveDateTime) -> Self {
        Self {
            is_completed: true,
            completed_at: time.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn now() -> Self {
        Self::at(chrono::Local::now().naive_local())
    }
}

/// Submission is allowed once, after every region is reviewed. A review
/// with no regions at all cannot be submitted.
pub fn ensure_submittable(review: &ReviewAssignment) -> Result<(), CoreError> {
    if review.is_completed {
        return Err(CoreError::ReviewClosed(format!("review {} is already submitted", review.id)));
    }
    let progress = review.progress();
    if progress.total == 0 {
        return Err(CoreError::ReviewClosed(format!("review {} has no tinkhundla", review.id)));
    }
    if !progress.is_done() {
        return Err(CoreError::ReviewClosed(format!(
            "{} tinkhundla remaining ({progress} reviewed)",
            progress.remaining()
        )));
    }
    Ok(())
}

/// Suggestions can only change while the review is open.
pub fn ensure_open(review: &ReviewAssignment) -> Result<(), CoreError> {
    if review.is_completed {
        return Err(CoreError::ReviewClosed(format!("review {} is already submitted", review.id)));
    }
    Ok(())
}
