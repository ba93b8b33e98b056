//! Token storage.
//!
//! Reads/writes <config dir>/auth.json (0600 on Unix).

use std::path::{Path, PathBuf};

use edm_core::{Ability, Grant, UserId};
use serde::{Deserialize, Serialize};

use crate::client::ClientError;

/// Session saved after `edm login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthCredentials {
    /// Bearer token for the backend API
    pub token: String,
    /// API base URL the token was issued by
    pub api_base: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<i64>,
    /// Grants from `/users/me`, cached for local capability checks
    #[serde(default)]
    pub abilities: Vec<Grant>,
    #[serde(default)]
    pub expiration_time: Option<String>,
}

impl AuthCredentials {
    pub fn new(token: String, api_base: String) -> Self {
        Self {
            token,
            api_base,
            user_id: None,
            email: None,
            name: None,
            role: None,
            abilities: Vec::new(),
            expiration_time: None,
        }
    }

    pub fn ability(&self) -> Ability {
        Ability::new(self.abilities.clone())
    }
}

/// Returns the path to the auth credentials file.
pub fn auth_file_path() -> PathBuf {
    edm_config::config_dir().join("auth.json")
}

/// Load saved auth credentials from disk.
/// Returns None if no credentials are saved or if the file is invalid.
pub fn load_auth() -> Option<AuthCredentials> {
    load_auth_from(&auth_file_path())
}

pub fn load_auth_from(path: &Path) -> Option<AuthCredentials> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(creds) => Some(creds),
        Err(e) => {
            log::warn!("ignoring unreadable auth file {}: {e}", path.display());
            None
        }
    }
}

pub fn save_auth(creds: &AuthCredentials) -> Result<(), ClientError> {
    save_auth_to(&auth_file_path(), creds)
}

/// Creates the parent directory if needed. Sets 0600 permissions on Unix.
pub fn save_auth_to(path: &Path, creds: &AuthCredentials) -> Result<(), ClientError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ClientError::Io(format!("failed to create config directory: {e}")))?;
    }

    let contents = serde_json::to_string_pretty(creds)
        .map_err(|e| ClientError::Parse(format!("failed to serialize credentials: {e}")))?;

    std::fs::write(path, &contents)
        .map_err(|e| ClientError::Io(format!("failed to write auth file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)
            .map_err(|e| ClientError::Io(format!("failed to set file permissions: {e}")))?;
    }

    Ok(())
}

/// Delete saved auth credentials. Returns whether a file was removed.
pub fn delete_auth() -> Result<bool, ClientError> {
    let path = auth_file_path();
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(&path)
        .map_err(|e| ClientError::Io(format!("failed to delete auth file: {e}")))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_fields() {
        let json = r#"{"token":"tok","api_base":"http://localhost:8000/api/v1"}"#;
        let parsed: AuthCredentials = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.token, "tok");
        assert!(parsed.user_id.is_none());
        assert!(parsed.abilities.is_empty());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edm/auth.json");

        let mut creds = AuthCredentials::new("tok123".into(), "https://edm.test/api/v1".into());
        creds.user_id = Some(4);
        creds.abilities = vec![Grant::new("read", "Publication")];
        save_auth_to(&path, &creds).unwrap();

        let loaded = load_auth_from(&path).unwrap();
        assert_eq!(loaded, creds);
        let subject = edm_core::Subject::Type("Publication");
        assert!(loaded.ability().can("read", &subject, "owner", None));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn corrupt_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_auth_from(&path).is_none());
        assert!(load_auth_from(&dir.path().join("missing.json")).is_none());
    }
}
