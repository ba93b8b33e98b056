//! `edm login`, `edm logout`, `edm whoami`.

use std::io::{self, Write};

use edm_client::{delete_auth, save_auth, AuthCredentials, DroughtClient};
use edm_config::Settings;
use edm_core::UserProfile;

use crate::exit_codes::*;
use crate::{print_json, util, CliError};

// ── Login ───────────────────────────────────────────────────────────

pub fn cmd_login(
    email: Option<String>,
    password: Option<String>,
    api_base: Option<String>,
) -> Result<(), CliError> {
    let api_base = match api_base {
        Some(base) => base.trim_end_matches('/').to_string(),
        None => Settings::load()
            .map_err(|e| CliError { code: EXIT_CONFIG, message: e.to_string(), hint: None })?
            .api_base,
    };

    // Flag or env, else interactive prompt
    let email = match email {
        Some(e) => e,
        None => prompt("Email: ", "pass --email or set EDM_EMAIL")?,
    };
    let password = match password {
        Some(p) => p,
        None => prompt("Password: ", "pass --password or set EDM_PASSWORD")?,
    };

    let login = DroughtClient::login(&api_base, &email, &password).map_err(|e| {
        let mut err = CliError::from(e);
        if err.code == EXIT_API_VALIDATION {
            err.code = EXIT_API_NOT_AUTH;
        }
        err
    })?;

    // Login omits the grants; fetch them with the new token.
    let mut creds = AuthCredentials::new(login.token, api_base);
    creds.expiration_time = login.expiration_time;
    let client = DroughtClient::new(&creds)?;
    let profile = client.me()?;
    creds.user_id = Some(profile.id);
    creds.email = Some(profile.email.clone());
    creds.name = Some(profile.name.clone());
    creds.role = profile.role;
    creds.abilities = profile.abilities.clone();

    save_auth(&creds)?;
    log::info!("saved session for user {}", profile.id);

    eprintln!("Logged in as {} ({}){}", profile.name, profile.email, role_suffix(&profile));
    Ok(())
}

fn prompt(label: &str, hint: &str) -> Result<String, CliError> {
    if !atty::is(atty::Stream::Stdin) {
        return Err(CliError {
            code: EXIT_USAGE,
            message: format!(
                "{} required and stdin is not a TTY",
                label.trim_end_matches([':', ' '])
            ),
            hint: Some(hint.into()),
        });
    }
    eprint!("{label}");
    io::stderr().flush().ok();
    let mut buf = String::new();
    io::stdin()
        .read_line(&mut buf)
        .map_err(|e| CliError::io(e.to_string()))?;
    let value = buf.trim().to_string();
    if value.is_empty() {
        return Err(CliError {
            code: EXIT_USAGE,
            message: "no value entered".into(),
            hint: Some(hint.into()),
        });
    }
    Ok(value)
}

fn role_suffix(profile: &UserProfile) -> String {
    profile.role().map(|r| format!(" as {}", r.label())).unwrap_or_default()
}

// ── Logout ──────────────────────────────────────────────────────────

pub fn cmd_logout() -> Result<(), CliError> {
    if delete_auth()? {
        eprintln!("Logged out");
    } else {
        eprintln!("Not logged in");
    }
    Ok(())
}

// ── Whoami ──────────────────────────────────────────────────────────

pub fn cmd_whoami(json: bool) -> Result<(), CliError> {
    let client = DroughtClient::from_saved_auth()?;
    let profile = client.me()?;
    if json {
        return print_json(&profile);
    }

    println!("{} <{}>{}", profile.name, profile.email, role_suffix(&profile));
    if let Some(twg) = &profile.technical_working_group {
        println!("Working group: {twg}");
    }
    println!("API: {}", client.api_base());
    if !profile.abilities.is_empty() {
        println!();
        let headers = ["Action", "Subject", "Conditions"].map(String::from).to_vec();
        let rows: Vec<Vec<String>> = profile
            .abilities
            .iter()
            .map(|g| {
                let conditions = g
                    .conditions
                    .as_ref()
                    .map(|c| serde_json::Value::Object(c.clone()).to_string())
                    .unwrap_or_default();
                vec![g.action.clone(), g.subject.clone(), conditions]
            })
            .collect();
        print!("{}", util::render_table(&headers, &rows, 40));
    }
    Ok(())
}
