//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `edm` exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                              |
//! |---------|-----------|------------------------------------------|
//! | 0       | Universal | Success                                  |
//! | 1       | Universal | General error (unspecified)              |
//! | 2       | Universal | CLI usage error (bad args, bad category) |
//! | 3       | Universal | Configuration file unreadable            |
//! | 40-49   | api       | Backend session, transport and rejects   |
//! | 50-59   | data      | Region dataset and workflow preconditions|
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Map the error to it in `CliError`

use edm_client::ClientError;
use edm_core::CoreError;

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unparseable category or layer.
pub const EXIT_USAGE: u8 = 2;

/// config.toml exists but cannot be read or parsed.
pub const EXIT_CONFIG: u8 = 3;

// =============================================================================
// API (40-49)
// =============================================================================

/// No saved session, or the backend rejected the token.
pub const EXIT_API_NOT_AUTH: u8 = 40;

/// The session's grants do not allow the action.
pub const EXIT_API_FORBIDDEN: u8 = 41;

/// Backend unreachable.
pub const EXIT_API_NETWORK: u8 = 42;

/// Backend rejected the request (400/422).
pub const EXIT_API_VALIDATION: u8 = 43;

/// Any other non-2xx response, or an unparseable body.
pub const EXIT_API_HTTP: u8 = 44;

/// Publish request accepted but the stored status is not Published.
pub const EXIT_API_PUBLISH_UNCONFIRMED: u8 = 45;

// =============================================================================
// Data (50-59)
// =============================================================================

/// Region dataset not configured, unreadable or malformed.
pub const EXIT_DATA_REGIONS: u8 = 50;

/// Selected regions fail the bulk copy precondition.
pub const EXIT_DATA_NOT_ELIGIBLE: u8 = 51;

/// Region id not in the roster or the review.
pub const EXIT_DATA_UNKNOWN_REGION: u8 = 52;

/// Review is submitted, has regions remaining, or the region is locked.
pub const EXIT_DATA_REVIEW_STATE: u8 = 53;

/// Map a client error to its exit code.
pub fn client_exit_code(err: &ClientError) -> u8 {
    match err {
        ClientError::NotAuthenticated => EXIT_API_NOT_AUTH,
        ClientError::Network(_) => EXIT_API_NETWORK,
        ClientError::Validation(_) => EXIT_API_VALIDATION,
        ClientError::Http(403, _) => EXIT_API_FORBIDDEN,
        ClientError::Http(..) | ClientError::Parse(_) => EXIT_API_HTTP,
        ClientError::Io(_) => EXIT_ERROR,
    }
}

/// Map a domain error to its exit code.
pub fn core_exit_code(err: &CoreError) -> u8 {
    match err {
        CoreError::UnknownCategory(_) | CoreError::UnknownLayer(_) => EXIT_USAGE,
        CoreError::RegionDataset(_) => EXIT_DATA_REGIONS,
        CoreError::NotBulkEligible(_) => EXIT_DATA_NOT_ELIGIBLE,
        CoreError::UnknownRegion(_) => EXIT_DATA_UNKNOWN_REGION,
        CoreError::ReviewClosed(_) => EXIT_DATA_REVIEW_STATE,
        CoreError::CommentRequired(_)
        | CoreError::SuggestionRequired(_)
        | CoreError::InvalidPublication(_) => EXIT_USAGE,
        CoreError::Progress(_) => EXIT_API_HTTP,
    }
}
