//! Drought monitor HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required).

use std::time::Duration;

use edm_core::review::{ReviewAssignment, ReviewCompletion, SuggestionUpdate};
use edm_core::validation::{PublishRequest, ReviewFilter, ValidatedValuesUpdate};
use edm_core::{
    NewPublication, Page, Publication, PublicationDate, PublicationReviews, ReviewDetails,
    UserProfile,
};
use reqwest::blocking::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{load_auth, AuthCredentials};

/// Backend API client (blocking).
#[derive(Clone)]
pub struct DroughtClient {
    http: reqwest::blocking::Client,
    api_base: String,
    /// Empty for the public client.
    token: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// No saved session, or the backend rejected the token
    #[error("not authenticated, run `edm login` first")]
    NotAuthenticated,
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {0}: {1}")]
    Http(u16, String),
    /// 400/422 with the backend's message
    #[error("{0}")]
    Validation(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("I/O error: {0}")]
    Io(String),
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub token: String,
    #[serde(default)]
    pub expiration_time: Option<String>,
}

impl DroughtClient {
    /// Create a new client using saved auth credentials.
    pub fn from_saved_auth() -> Result<Self, ClientError> {
        let creds = load_auth().ok_or(ClientError::NotAuthenticated)?;
        Self::new(&creds)
    }

    /// Create a new client with explicit credentials.
    pub fn new(creds: &AuthCredentials) -> Result<Self, ClientError> {
        Ok(Self {
            http: build_http()?,
            api_base: creds.api_base.trim_end_matches('/').to_string(),
            token: creds.token.clone(),
        })
    }

    /// Client for the public map endpoints; sends no bearer token.
    pub fn public(api_base: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http: build_http()?,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: String::new(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Exchange email and password for a bearer token.
    pub fn login(
        api_base: &str,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, ClientError> {
        let url = format!("{}/auth/login", api_base.trim_end_matches('/'));
        log::debug!("POST {url}");
        let response = build_http()?
            .post(&url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(match status {
                400 | 401 | 422 => ClientError::Validation(backend_message(&body)),
                _ => ClientError::Http(status, body),
            });
        }
        parse(response)
    }

    /// Verify the current token and get the account with its grants.
    pub fn me(&self) -> Result<UserProfile, ClientError> {
        parse(self.send(self.http.get(self.url("/users/me")))?)
    }

    pub fn publication(&self, id: i64) -> Result<Publication, ClientError> {
        parse(self.send(self.http.get(self.url(&format!("/admin/publication/{id}"))))?)
    }

    /// One page of publications, newest first.
    pub fn publications(&self, page: u32) -> Result<Page<Publication>, ClientError> {
        let req = self.http.get(self.url("/admin/publications")).query(&[("page", page)]);
        parse(self.send(req)?)
    }

    /// Open a publication for review and notify the reviewers.
    pub fn create_publication(&self, request: &NewPublication) -> Result<Publication, ClientError> {
        log::info!(
            "creating publication for {} with {} reviewer(s)",
            request.year_month,
            request.reviewers.len()
        );
        parse(self.send(self.http.post(self.url("/admin/publications")).json(request))?)
    }

    /// One reviewer's assignment, admin view.
    pub fn publication_review(&self, id: i64) -> Result<ReviewDetails, ClientError> {
        parse(self.send(self.http.get(self.url(&format!("/admin/publication-review/{id}"))))?)
    }

    /// Published periods, newest first.
    pub fn dates(&self) -> Result<Vec<PublicationDate>, ClientError> {
        parse(self.send(self.http.get(self.url("/dates")))?)
    }

    /// A published map with its validated values.
    pub fn published_map(&self, id: i64) -> Result<Publication, ClientError> {
        parse(self.send(self.http.get(self.url(&format!("/map/{id}"))))?)
    }

    /// Reviewer suggestions for a publication. Filters are only sent when set.
    pub fn publication_reviews(
        &self,
        id: i64,
        filter: &ReviewFilter,
    ) -> Result<PublicationReviews, ClientError> {
        let mut req = self.http.get(self.url(&format!("/admin/publication-reviews/{id}")));
        if !filter.is_empty() {
            req = req.query(&filter.query());
        }
        parse(self.send(req)?)
    }

    /// Replace the publication's validated values. Returns the stored record.
    pub fn update_validated_values(
        &self,
        id: i64,
        update: &ValidatedValuesUpdate,
    ) -> Result<Publication, ClientError> {
        log::info!(
            "updating {} validated values on publication {id}",
            update.validated_values.len()
        );
        self.put_json(&format!("/admin/publication/{id}"), update)
    }

    pub fn publish(&self, id: i64, request: &PublishRequest) -> Result<Publication, ClientError> {
        log::info!("publishing publication {id}");
        self.put_json(&format!("/admin/publication/{id}"), request)
    }

    pub fn review(&self, id: i64) -> Result<ReviewAssignment, ClientError> {
        parse(self.send(self.http.get(self.url(&format!("/reviewer/review/{id}"))))?)
    }

    pub fn update_suggestions(
        &self,
        id: i64,
        update: &SuggestionUpdate,
    ) -> Result<ReviewAssignment, ClientError> {
        self.put_json(&format!("/reviewer/review/{id}"), update)
    }

    pub fn complete_review(
        &self,
        id: i64,
        completion: &ReviewCompletion,
    ) -> Result<ReviewAssignment, ClientError> {
        log::info!("submitting review {id}");
        self.put_json(&format!("/reviewer/review/{id}"), completion)
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        parse(self.send(self.http.put(self.url(path)).json(body))?)
    }

    fn send(&self, req: RequestBuilder) -> Result<Response, ClientError> {
        let req = if self.token.is_empty() { req } else { req.bearer_auth(&self.token) };
        let response = req
            .send()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        log::debug!("{} {}", response.status().as_u16(), response.url());

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(match status {
                401 => ClientError::NotAuthenticated,
                400 | 422 => ClientError::Validation(backend_message(&body)),
                _ => ClientError::Http(status, body),
            });
        }

        Ok(response)
    }
}

fn build_http() -> Result<reqwest::blocking::Client, ClientError> {
    reqwest::blocking::Client::builder()
        .user_agent(format!("edm/{}", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|e| ClientError::Network(format!("failed to create HTTP client: {e}")))
}

fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    response.json::<T>().map_err(|e| ClientError::Parse(e.to_string()))
}

/// `{"message": ...}` from an error body, else the body itself.
fn backend_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("detail"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}
