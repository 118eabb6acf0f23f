use chrono::NaiveDate;
use thiserror::Error;

/// タイムエントリーの取得に失敗した時のエラー。
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to send request to Toggl API: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Toggl API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to deserialize time entries: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Local day boundary does not exist for {0}")]
    DayBoundary(NaiveDate),
}

/// タイムエントリーの作成に失敗した時のエラー。
#[derive(Debug, Error)]
pub enum CreateError {
    #[error("Failed to send request to Toggl API: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Toggl API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to deserialize created time entry: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Request to Toggl API timed out: {0}")]
    Timeout(#[source] reqwest::Error),
}

/// 設定の読み込みに失敗した時のエラー。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOGGL_API_TOKEN must be set (or written to {})", .path.as_deref().unwrap_or("<no config dir>"))]
    MissingToken { path: Option<String> },

    #[error("Failed to read API token file at `{path}`: {original}")]
    TokenFile {
        path: String,
        #[source]
        original: std::io::Error,
    },

    #[error("Invalid value for {key}: `{value}`")]
    InvalidValue { key: String, value: String },
}
