//! Publication administration and public browsing records.
//!
//! List items, single records and published maps all deserialize into
//! [`Publication`](crate::Publication); this module adds the page wrapper, the create body and
//! the admin view of one review.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{InitialValue, Reviewer, SuggestionValue, UserId};
use crate::review::{saved_or_initial, PublicationInfo, ReviewProgress};

pub const DEFAULT_MAIL_SUBJECT: &str = "CDI Map review requested for month";
pub const DEFAULT_MAIL_MESSAGE: &str = "<p>Dear {{reviewer_name}}, The CDI Map for the month of \
    {{year_month}} is available for review. Please submit your review by {{due_date}}.</p>";

/// Paginated list response: `{current, total, total_page, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "first_page")]
    pub current: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_page: u32,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.current < self.total_page
    }
}

/// Body of `POST /admin/publications`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPublication {
    pub cdi_geonode_id: i64,
    pub year_month: String,
    pub due_date: String,
    pub initial_values: Vec<InitialValue>,
    pub reviewers: Vec<UserId>,
    pub subject: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl NewPublication {
    /// Validate and normalise a create request.
    ///
    /// `year_month` takes `YYYY-MM` or a full date and is sent as the first
    /// of the month. `due_date` must be `YYYY-MM-DD` and not before `today`.
    /// At least one reviewer is required.
    pub fn new(
        cdi_geonode_id: i64,
        year_month: &str,
        due_date: &str,
        reviewers: Vec<UserId>,
        today: NaiveDate,
    ) -> Result<Self, CoreError> {
        let month = parse_month(year_month)?;
        let due = NaiveDate::parse_from_str(due_date.trim(), "%Y-%m-%d").map_err(|_| {
            CoreError::InvalidPublication(format!("due date '{due_date}' is not YYYY-MM-DD"))
        })?;
        if due < today {
            return Err(CoreError::InvalidPublication(format!(
                "due date {due} is in the past"
            )));
        }
        let mut reviewers = reviewers;
        reviewers.sort_unstable();
        reviewers.dedup();
        if reviewers.is_empty() {
            return Err(CoreError::InvalidPublication(
                "Please select at least one reviewer.".into(),
            ));
        }

        Ok(Self {
            cdi_geonode_id,
            year_month: month.format("%Y-%m-%d").to_string(),
            due_date: due.format("%Y-%m-%d").to_string(),
            initial_values: Vec::new(),
            reviewers,
            subject: DEFAULT_MAIL_SUBJECT.to_string(),
            message: DEFAULT_MAIL_MESSAGE.to_string(),
            download_url: None,
        })
    }

    pub fn with_mail(mut self, subject: Option<String>, message: Option<String>) -> Self {
        if let Some(subject) = subject.filter(|s| !s.trim().is_empty()) {
            self.subject = subject;
        }
        if let Some(message) = message.filter(|m| !m.trim().is_empty()) {
            self.message = message;
        }
        self
    }

    pub fn with_download_url(mut self, url: Option<String>) -> Self {
        self.download_url = url.filter(|u| !u.trim().is_empty());
        self
    }
}

fn parse_month(input: &str) -> Result<NaiveDate, CoreError> {
    let trimmed = input.trim();
    let padded = if trimmed.len() == 7 { format!("{trimmed}-01") } else { trimmed.to_string() };
    let date = NaiveDate::parse_from_str(&padded, "%Y-%m-%d").map_err(|_| {
        CoreError::InvalidPublication(format!("year-month '{input}' is not YYYY-MM"))
    })?;
    Ok(date.with_day0(0).unwrap_or(date))
}

/// Response of `GET /admin/publication-review/{id}`: one reviewer's
/// assignment as the admin sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDetails {
    pub id: i64,
    #[serde(default)]
    pub publication: Option<PublicationInfo>,
    pub user: Reviewer,
    #[serde(default)]
    pub suggestion_values: Option<Vec<SuggestionValue>>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl ReviewDetails {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Saved suggestions, or the computed values when nothing is saved.
    pub fn values(&self) -> Vec<SuggestionValue> {
        saved_or_initial(self.suggestion_values.as_deref(), self.publication.as_ref())
    }

    pub fn progress(&self) -> ReviewProgress {
        let values = self.values();
        ReviewProgress::of(&values, values.len())
    }
}

/// Entry of `GET /dates`: a published map and its period label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationDate {
    /// Publication id.
    pub value: i64,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()
    }

    #[test]
    fn create_request_normalises_dates() {
        let request =
            NewPublication::new(7, "2025-01", "2025-02-10", vec![22, 21, 22], today()).unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["year_month"], "2025-01-01");
        assert_eq!(body["due_date"], "2025-02-10");
        assert_eq!(body["reviewers"], json!([21, 22]));
        assert_eq!(body["initial_values"], json!([]));
        assert_eq!(body["subject"], DEFAULT_MAIL_SUBJECT);
        assert!(body.get("download_url").is_none());

        let mid_month =
            NewPublication::new(7, "2025-01-15", "2025-02-01", vec![1], today()).unwrap();
        assert_eq!(mid_month.year_month, "2025-01-01");
    }

    #[test]
    fn create_request_checks() {
        let err = NewPublication::new(7, "2025-01", "2025-02-10", vec![], today()).unwrap_err();
        assert_eq!(err.to_string(), "Please select at least one reviewer.");
        assert!(NewPublication::new(7, "2025-01", "2025-01-31", vec![1], today()).is_err());
        assert!(NewPublication::new(7, "January", "2025-02-10", vec![1], today()).is_err());
        assert!(NewPublication::new(7, "2025-01", "10/02/2025", vec![1], today()).is_err());
    }

    #[test]
    fn blank_mail_overrides_keep_defaults() {
        let request = NewPublication::new(7, "2025-01", "2025-02-10", vec![1], today())
            .unwrap()
            .with_mail(Some("  ".into()), Some("<p>Please review</p>".into()))
            .with_download_url(Some("https://geonode.example.org/cdi.tif".into()));
        assert_eq!(request.subject, DEFAULT_MAIL_SUBJECT);
        assert_eq!(request.message, "<p>Please review</p>");
        assert!(request.download_url.is_some());
    }

    #[test]
    fn page_shape() {
        let page: Page<crate::Publication> = serde_json::from_value(json!({
            "current": 1,
            "total": 12,
            "total_page": 2,
            "data": [
                {"id": 4, "year_month": "2025-01-01", "due_date": "2025-02-10", "status": 1}
            ]
        }))
        .unwrap();
        assert!(page.has_next());
        assert_eq!(page.data[0].period_label(), "January 2025");
        assert!(page.data[0].validated_values.is_empty());
    }

    #[test]
    fn review_details_shape() {
        let details: ReviewDetails = serde_json::from_value(json!({
            "id": 11,
            "publication": {
                "id": 4,
                "year_month": "2025-01-01",
                "due_date": "2025-02-10",
                "initial_values": [],
                "status": 1
            },
            "user": {
                "id": 21,
                "name": "Ann Dlamini",
                "email": "ann@example.org",
                "email_verified": true,
                "technical_working_group": 3
            },
            "suggestion_values": null,
            "created_at": "2025-01-20T08:00:00",
            "updated_at": "2025-01-20T08:00:00",
            "completed_at": null
        }))
        .unwrap();
        assert!(!details.is_completed());
        assert_eq!(
            details.user.technical_working_group.as_deref(),
            Some("MET (Meteorological Office)")
        );
        assert!(details.suggestion_values.is_none());
        assert!(details.values().is_empty());
        assert!(!details.progress().is_done());
    }

    #[test]
    fn review_details_fall_back_to_computed_values() {
        let details: ReviewDetails = serde_json::from_value(json!({
            "id": 11,
            "publication": {"id": 4, "initial_values": [
                {"administration_id": 1, "category": 2},
                {"administration_id": 2, "category": 0}
            ]},
            "user": {"id": 21, "name": "Ann Dlamini", "email": "ann@example.org"},
            "suggestion_values": []
        }))
        .unwrap();
        assert_eq!(details.values().len(), 2);
        assert_eq!(details.progress().to_string(), "0/2");
    }
}
