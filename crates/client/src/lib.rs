//! Drought monitor backend client.
//!
//! Single source of truth for the wire contract: login, profile,
//! publications, publication reviews, reviewer assignments.
//!
//! Blocking, no retries. Every update sends a full replacement list.

mod auth;
mod client;

pub use auth::{
    auth_file_path, delete_auth, load_auth, load_auth_from, save_auth, save_auth_to,
    AuthCredentials,
};
pub use client::{ClientError, DroughtClient, LoginResponse};
