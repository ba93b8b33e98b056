use thiserror::Error;

use crate::model::AdministrationId;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Category name or code not in the taxonomy.
    #[error("unknown drought category: {0}")]
    UnknownCategory(String),
    /// Map layer name not recognised.
    #[error("unknown map layer '{0}' (expected validated, computed or reviewer:<id>)")]
    UnknownLayer(String),
    /// Region id not present in the loaded roster.
    #[error("unknown administration id: {0}")]
    UnknownRegion(AdministrationId),
    /// Boundary dataset could not be read as GeoJSON or TopoJSON.
    #[error("region dataset: {0}")]
    RegionDataset(String),
    /// Selected regions fail the bulk precondition.
    #[error("{} region(s) not eligible for bulk copy: {}", .0.len(), join_ids(.0))]
    NotBulkEligible(Vec<AdministrationId>),
    /// Region has no usable category to approve; a suggestion is needed.
    #[error("a suggested category is required for {0} (no computed value to approve)")]
    SuggestionRequired(AdministrationId),
    /// A changed category needs a justification.
    #[error("a comment is required when suggesting a different category for {0}")]
    CommentRequired(AdministrationId),
    /// Review submitted, or submission attempted with regions remaining.
    #[error("{0}")]
    ReviewClosed(String),
    /// New publication request failed local checks.
    #[error("{0}")]
    InvalidPublication(String),
    /// Malformed "reviewed/total" progress string.
    #[error("cannot parse review progress '{0}'")]
    Progress(String),
}

fn join_ids(ids: &[AdministrationId]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}
