//! `edm-core`: drought monitor review and validation domain.
//!
//! Pure crate: receives pre-loaded regions, reviews and publications,
//! returns reconciled rows, update payloads and view models.
//! No HTTP or CLI dependencies.

pub mod ability;
pub mod category;
pub mod error;
pub mod model;
pub mod presentation;
pub mod publication;
pub mod reconcile;
pub mod regions;
pub mod review;
pub mod selection;
pub mod validation;

pub use ability::{Ability, Actor, Grant, Subject};
pub use category::{category_of, CategoryInfo, DroughtCategory, TAXONOMY};
pub use error::CoreError;
pub use model::{
    AdministrationId, AdministrativeRegion, InitialValue, Publication, PublicationReviews,
    PublicationStatus, ReconciledRow, Reviewer, ReviewerCell, ReviewerSuggestion,
    SuggestionValue, UserId, UserProfile, UserRole, ValidatedValue,
};
pub use publication::{NewPublication, Page, PublicationDate, ReviewDetails};
pub use reconcile::reconcile;
pub use selection::SelectionState;
pub use review::{ReviewAssignment, ReviewCompletion, ReviewProgress, SuggestionUpdate};
pub use validation::{PublishRequest, ReviewFilter, ValidatedValuesUpdate};
