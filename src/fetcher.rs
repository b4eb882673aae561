use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::auth;
use crate::config::Config;
use crate::error::AppError;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

// Only ask for what the normalizer reads; everything else stays on Google's
// side of the wire.
const FIELDS_MASK: &str =
    "sheets.data.rowData.values(formattedValue,effectiveFormat.backgroundColor)";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One cell of the raw grid: its display string plus, when the API sent it,
/// the effective background color.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    #[serde(default)]
    pub formatted_value: Option<String>,
    #[serde(default)]
    pub effective_format: Option<CellFormat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFormat {
    #[serde(default)]
    pub background_color: Option<RgbColor>,
}

/// Color channels as the API reports them: floats in [0, 1], with fully
/// intense channels often omitted entirely.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RgbColor {
    #[serde(default)]
    pub red: Option<f64>,
    #[serde(default)]
    pub green: Option<f64>,
    #[serde(default)]
    pub blue: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GridRow {
    #[serde(default)]
    pub values: Vec<GridCell>,
}

// Wrapper layers of the spreadsheets.get response down to the row data.
#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    #[serde(default)]
    data: Vec<GridData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridData {
    #[serde(default)]
    row_data: Vec<GridRow>,
}

/// Where snapshots come from. The one real implementation talks to the
/// Sheets API; tests substitute an in-memory grid.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Read one tab as a raw grid. An empty vec is a valid result (empty
    /// sheet), not an error.
    async fn fetch_grid(&self, sheet: &str) -> Result<Vec<GridRow>, AppError>;
}

/// Reads grids from the Google Sheets v4 REST API with service-account auth.
pub struct GoogleSheetSource {
    http: reqwest::Client,
    spreadsheet_id: String,
    credentials_path: std::path::PathBuf,
}

impl GoogleSheetSource {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(GoogleSheetSource {
            http,
            spreadsheet_id: config.spreadsheet_id.clone(),
            credentials_path: config.credentials_path.clone(),
        })
    }
}

#[async_trait]
impl SheetSource for GoogleSheetSource {
    async fn fetch_grid(&self, sheet: &str) -> Result<Vec<GridRow>, AppError> {
        let token = auth::bearer_token(&self.credentials_path).await?;

        let url = format!("{}/{}", SHEETS_API_BASE, self.spreadsheet_id);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("ranges", range_for(sheet).as_str()),
                ("includeGridData", "true"),
                ("fields", FIELDS_MASK),
            ])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("request to Sheets API failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Fetch(format!(
                "Sheets API returned {status} for sheet {sheet:?}: {body}"
            )));
        }

        let parsed: GetResponse = response
            .json()
            .await
            .map_err(|e| AppError::Fetch(format!("failed to decode Sheets API response: {e}")))?;

        Ok(grid_rows(parsed))
    }
}

// A1 notation needs sheet titles quoted when they contain anything beyond
// alphanumerics/underscores ("Metricas PIC" -> "'Metricas PIC'").
fn range_for(sheet: &str) -> String {
    let plain = !sheet.is_empty()
        && sheet
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    }
}

fn grid_rows(response: GetResponse) -> Vec<GridRow> {
    response
        .sheets
        .into_iter()
        .next()
        .and_then(|s| s.data.into_iter().next())
        .map(|d| d.row_data)
        .unwrap_or_default()
}
