use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ability::Grant;

pub type AdministrationId = i64;
pub type UserId = i64;

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

/// One inkhundla from the boundary dataset. Immutable for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdministrativeRegion {
    pub administration_id: AdministrationId,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Publication values
// ---------------------------------------------------------------------------

/// System-computed category for a region, read-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialValue {
    pub administration_id: AdministrationId,
    #[serde(default, deserialize_with = "crate::category::code::deserialize")]
    pub category: Option<i32>,
    /// Raw CDI number behind the category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Admin-reconciled category. `None` until the region is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedValue {
    pub administration_id: AdministrationId,
    #[serde(default, deserialize_with = "crate::category::code::deserialize")]
    pub category: Option<i32>,
}

/// One reviewer's proposal for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionValue {
    pub administration_id: AdministrationId,
    #[serde(default, deserialize_with = "crate::category::code::deserialize")]
    pub category: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub reviewed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl From<&InitialValue> for SuggestionValue {
    fn from(initial: &InitialValue) -> Self {
        Self {
            administration_id: initial.administration_id,
            category: initial.category,
            comment: None,
            reviewed: false,
            value: initial.value,
        }
    }
}

/// Suggestion tagged with its author, as flattened by the reviews endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerSuggestion {
    pub user_id: UserId,
    #[serde(flatten)]
    pub suggestion: SuggestionValue,
}

// ---------------------------------------------------------------------------
// Reviewers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_twg")]
    pub technical_working_group: Option<String>,
}

impl Reviewer {
    /// "Name (email)" as shown in audit comments.
    pub fn display(&self) -> String {
        format!("{} ({})", self.name, self.email)
    }

    /// Column title: working group, falling back to the reviewer's name.
    pub fn column_title(&self) -> &str {
        self.technical_working_group.as_deref().unwrap_or(&self.name)
    }
}

/// Label for the backend's technical working group codes.
pub fn twg_label(code: i64) -> Option<&'static str> {
    match code {
        1 => Some("NDMA (National Disaster Management Agency)"),
        2 => Some("MoAg (Ministry of Agriculture)"),
        3 => Some("MET (Meteorological Office)"),
        4 => Some("DWA (Department of Water Affairs)"),
        5 => Some("UNESWA (University of Eswatini)"),
        _ => None,
    }
}

fn deserialize_twg<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => n.as_i64().map(|code| {
            twg_label(code).map(String::from).unwrap_or_else(|| code.to_string())
        }),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Reviewer,
}

impl UserRole {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Admin),
            2 => Some(Self::Reviewer),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Reviewer => "Reviewer",
        }
    }
}

/// Account returned by login and `GET /users/me`. Login omits `abilities`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<i64>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub abilities: Vec<Grant>,
    #[serde(default, deserialize_with = "deserialize_twg")]
    pub technical_working_group: Option<String>,
}

impl UserProfile {
    pub fn role(&self) -> Option<UserRole> {
        self.role.and_then(UserRole::from_code)
    }
}

// ---------------------------------------------------------------------------
// Publication
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationStatus {
    InReview,
    InValidation,
    Published,
}

impl PublicationStatus {
    pub fn code(&self) -> i32 {
        match self {
            Self::InReview => 1,
            Self::InValidation => 2,
            Self::Published => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::InReview),
            2 => Some(Self::InValidation),
            3 => Some(Self::Published),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::InReview => "In Review",
            Self::InValidation => "In Validation",
            Self::Published => "Published",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub id: i64,
    #[serde(default)]
    pub year_month: Option<String>,
    #[serde(default)]
    pub initial_values: Vec<InitialValue>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub validated_values: Vec<ValidatedValue>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulletin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl Publication {
    pub fn status(&self) -> Option<PublicationStatus> {
        self.status.and_then(PublicationStatus::from_code)
    }

    pub fn initial_category(&self, id: AdministrationId) -> Option<i32> {
        self.initial_values
            .iter()
            .find(|v| v.administration_id == id)
            .and_then(|v| v.category)
    }

    pub fn validated_category(&self, id: AdministrationId) -> Option<i32> {
        self.validated_values
            .iter()
            .find(|v| v.administration_id == id)
            .and_then(|v| v.category)
    }

    /// "January 2025" for a "2025-01" or "2025-01-15" year_month.
    pub fn period_label(&self) -> String {
        let Some(ym) = self.year_month.as_deref() else {
            return "...".to_string();
        };
        let padded = if ym.len() == 7 { format!("{ym}-01") } else { ym.to_string() };
        match chrono::NaiveDate::parse_from_str(&padded, "%Y-%m-%d") {
            Ok(date) => date.format("%B %Y").to_string(),
            Err(_) => ym.to_string(),
        }
    }
}

/// Response of `GET /admin/publication-reviews/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PublicationReviews {
    #[serde(default)]
    pub reviews: Vec<ReviewerSuggestion>,
    #[serde(default)]
    pub users: Vec<Reviewer>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub validated_values: Vec<ValidatedValue>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Reconciled output
// ---------------------------------------------------------------------------

/// Audit metadata for one reviewer's contribution to one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentMeta {
    pub user: String,
    pub twg: Option<String>,
    pub comment: Option<String>,
    pub category: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewerCell {
    pub category: Option<i32>,
    pub comment: CommentMeta,
}

/// One region merged across computed, reviewer and validated values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledRow {
    pub administration_id: AdministrationId,
    pub name: String,
    pub initial_category: Option<i32>,
    pub category: Option<i32>,
    /// Keyed by reviewer id.
    pub reviews: BTreeMap<UserId, ReviewerCell>,
}

impl ReconciledRow {
    pub fn is_validated(&self) -> bool {
        self.category.is_some()
    }

    /// Defined reviewer categories in reviewer-id order.
    pub fn reviewer_values(&self) -> impl Iterator<Item = i32> + '_ {
        self.reviews.values().filter_map(|cell| cell.category)
    }

    pub fn has_contribution(&self) -> bool {
        self.reviewer_values().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn publication_tolerates_null_validated_values() {
        let p: Publication = serde_json::from_value(json!({
            "id": 7,
            "year_month": "2025-01",
            "initial_values": [{"value": 3.5, "administration_id": 1253002, "category": 4}],
            "validated_values": null,
            "status": 2
        }))
        .unwrap();
        assert!(p.validated_values.is_empty());
        assert_eq!(p.initial_category(1253002), Some(4));
        assert_eq!(p.initial_category(1), None);
        assert_eq!(p.status(), Some(PublicationStatus::InValidation));
        assert_eq!(p.period_label(), "January 2025");
    }

    #[test]
    fn suggestion_category_may_be_missing() {
        let s: SuggestionValue =
            serde_json::from_value(json!({"administration_id": 5})).unwrap();
        assert_eq!(s.category, None);
        assert!(!s.reviewed);
    }

    #[test]
    fn flattened_reviewer_suggestion() {
        let r: ReviewerSuggestion = serde_json::from_value(json!({
            "user_id": 3,
            "administration_id": 10,
            "category": "d1",
            "comment": "dry spell",
            "reviewed": true
        }))
        .unwrap();
        assert_eq!(r.user_id, 3);
        assert_eq!(r.suggestion.category, Some(2));
        assert_eq!(r.suggestion.comment.as_deref(), Some("dry spell"));
    }

    #[test]
    fn twg_codes_map_to_labels() {
        let r: Reviewer = serde_json::from_value(json!({
            "id": 1, "name": "Ann", "email": "ann@example.com", "technical_working_group": 3
        }))
        .unwrap();
        assert_eq!(r.technical_working_group.as_deref(), Some("MET (Meteorological Office)"));
        assert_eq!(r.display(), "Ann (ann@example.com)");

        let r: Reviewer = serde_json::from_value(json!({
            "id": 2, "name": "Bo", "email": "bo@example.com"
        }))
        .unwrap();
        assert_eq!(r.column_title(), "Bo");
    }

    #[test]
    fn profile_from_users_me() {
        let p: UserProfile = serde_json::from_value(json!({
            "id": 4,
            "name": "Admin",
            "email": "admin@example.org",
            "role": 1,
            "email_verified": true,
            "abilities": [
                {"action": "update", "subject": "Review", "conditions": {"owner": "true"}}
            ],
            "technical_working_group": null
        }))
        .unwrap();
        assert_eq!(p.role(), Some(UserRole::Admin));
        assert_eq!(p.abilities.len(), 1);
        assert!(p.technical_working_group.is_none());

        let login_user: UserProfile = serde_json::from_value(json!({
            "id": 5, "name": "R", "email": "r@example.org", "role": 2
        }))
        .unwrap();
        assert!(login_user.abilities.is_empty());
        assert_eq!(login_user.role().map(|r| r.label()), Some("Reviewer"));
    }

    #[test]
    fn validated_value_serializes_null_category() {
        let v = ValidatedValue { administration_id: 1, category: None };
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({"administration_id": 1, "category": null})
        );
    }
}
