use std::path::Path;

use crate::error::AppError;

/// The spreadsheet is strictly read-only from our side.
pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets.readonly"];

/// Obtain a bearer token for the Sheets API from a service-account key file.
///
/// The path comes from `GOOGLE_APPLICATION_CREDENTIALS` (default
/// `service-account.json`). A missing file is a `Config` error naming the
/// path, so the operator knows exactly what to fix; anything past that point
/// (token exchange against Google) is a `Fetch` error.
///
/// # Arguments
/// * `creds_path` - Resolved path of the service-account JSON key
///
/// # Returns
/// * `Result<String, AppError>` - An access token usable as `Bearer` auth
pub async fn bearer_token(creds_path: &Path) -> Result<String, AppError> {
    if !creds_path.exists() {
        return Err(AppError::Config(format!(
            "credentials file not found: {}; set GOOGLE_APPLICATION_CREDENTIALS \
             or place service-account.json in the working directory",
            creds_path.display()
        )));
    }

    let key = yup_oauth2::read_service_account_key(creds_path)
        .await
        .map_err(|e| {
            AppError::Config(format!(
                "could not read service-account key {}: {}",
                creds_path.display(),
                e
            ))
        })?;

    let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
        .build()
        .await
        .map_err(|e| AppError::Fetch(format!("failed to build authenticator: {e}")))?;

    let token = auth
        .token(SCOPES)
        .await
        .map_err(|e| AppError::Fetch(format!("token exchange failed: {e}")))?;

    token
        .token()
        .map(str::to_owned)
        .ok_or_else(|| AppError::Fetch("token response contained no access token".into()))
}
