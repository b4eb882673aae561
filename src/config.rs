use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration, read once at startup from the environment.
///
/// Every knob has a documented default so the binary runs with nothing but a
/// `service-account.json` next to it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Spreadsheet to proxy (`SPREADSHEET_ID`).
    pub spreadsheet_id: String,
    /// Tab holding the agents table (`SHEET_NAME`).
    pub agents_sheet: String,
    /// Tab behind `/api/metricas-pic/data` (`METRICAS_SHEET`).
    pub metricas_sheet: String,
    /// Tab behind `/api/matriz-noviembre/data` (`MATRIZ_SHEET`).
    pub matriz_sheet: String,
    /// Service-account key file (`GOOGLE_APPLICATION_CREDENTIALS`).
    pub credentials_path: PathBuf,
    /// How long a cached snapshot stays fresh (`CACHE_TTL_SECS`).
    pub cache_ttl: Duration,
    /// Listen port (`PORT`).
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            spreadsheet_id: env_or(
                "SPREADSHEET_ID",
                "1Iowck5rzr8gjIZwLCQazg1eNktoW6RQ9fmGnKoPNIyE",
            ),
            agents_sheet: env_or("SHEET_NAME", "Agentes"),
            metricas_sheet: env_or("METRICAS_SHEET", "Metricas PIC"),
            matriz_sheet: env_or("MATRIZ_SHEET", "Matriz Noviembre"),
            credentials_path: PathBuf::from(env_or(
                "GOOGLE_APPLICATION_CREDENTIALS",
                "service-account.json",
            )),
            cache_ttl: Duration::from_secs(env_num("CACHE_TTL_SECS", 120)),
            port: env_num("PORT", 8080),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

// Config values come from the operator, not from a request, so a bad number
// falls back to the default with a warning instead of failing anything.
fn env_num<T>(name: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
{
    match std::env::var(name) {
        Err(_) => default,
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("ignoring invalid {}={:?}, using {}", name, raw, default);
            default
        }),
    }
}
