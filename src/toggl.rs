use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
#[cfg(test)]
use mockall::automock;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{CreateError, FetchError};
use crate::time_entry::{TimeEntry, TimeEntryCreationRequest};

/// 作成したタイムエントリーに記録するクライアント名。
const CREATED_WITH: &str = "toggl-duplicator";

/// Toggl APIとのやり取りを抽象化したtrait。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TogglRepository: Send + Sync {
    /// 指定された期間に開始したタイムエントリーを取得する。
    ///
    /// # Arguments
    ///
    /// * `start_at` - 取得するタイムエントリーの開始日時
    /// * `end_at` - 取得するタイムエントリーの終了日時
    async fn read_time_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>, FetchError>;

    /// タイムエントリーを作成し、サーバーが返したタイムエントリーを返す。
    async fn create_time_entry(
        &self,
        request: &TimeEntryCreationRequest,
    ) -> Result<TimeEntry, CreateError>;
}

/// Toggl APIのレスポンスをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct TogglTimeEntry {
    id: i64,
    description: Option<String>,
    project_id: Option<i64>,
    workspace_id: i64,
    start: Option<DateTime<Utc>>,
    stop: Option<DateTime<Utc>>,
    duration: Option<i64>,
    tags: Option<Vec<String>>,
}

impl From<TogglTimeEntry> for TimeEntry {
    fn from(entry: TogglTimeEntry) -> Self {
        Self {
            id: entry.id,
            description: entry.description,
            start: entry.start,
            stop: entry.stop,
            duration: entry.duration,
            pid: entry.project_id,
            wid: entry.workspace_id,
            tags: entry.tags,
        }
    }
}

/// Toggl APIにタイムエントリーを作成するためのリクエストボディ。
#[derive(Debug, Serialize)]
struct TogglTimeEntryPost<'a> {
    created_with: &'a str,
    description: &'a str,
    duration: i64,
    project_id: Option<i64>,
    start: DateTime<Utc>,
    tags: &'a [String],
    workspace_id: i64,
}

impl<'a> From<&'a TimeEntryCreationRequest> for TogglTimeEntryPost<'a> {
    fn from(request: &'a TimeEntryCreationRequest) -> Self {
        Self {
            created_with: CREATED_WITH,
            description: &request.description,
            duration: request.duration,
            project_id: request.pid,
            start: request.start,
            tags: &request.tags,
            workspace_id: request.wid,
        }
    }
}

/// Toggl APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let client = TogglClient::new(&Config::load()?)?;
/// let time_entries = client.read_time_entries(&start_at, &end_at).await?;
/// ```
pub struct TogglClient {
    client: Client,
    api_url: String,
    api_token: String,
}

impl TogglClient {
    /// 新しい`TogglClient`を返す。
    ///
    /// リクエストごとのタイムアウトは`config.timeout`とする。
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_token: config.api_token.clone(),
        })
    }
}

#[async_trait]
impl TogglRepository for TogglClient {
    async fn read_time_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>, FetchError> {
        let response = self
            .client
            .get(format!("{}/me/time_entries", self.api_url))
            .basic_auth(&self.api_token, Some("api_token"))
            .header(CONTENT_TYPE, "application/json")
            .query(&[
                ("start_date", start_at.to_rfc3339()),
                ("end_date", end_at.to_rfc3339()),
            ])
            .send()
            .await
            .map_err(FetchError::Request)?;
        let response = error_for_status(response)
            .await
            .map_err(|(status, body)| FetchError::Status { status, body })?;
        let toggl_time_entries = response
            .json::<Vec<TogglTimeEntry>>()
            .await
            .map_err(FetchError::Decode)?;
        debug!("length of time entries: {}", toggl_time_entries.len());

        Ok(toggl_time_entries.into_iter().map(TimeEntry::from).collect())
    }

    async fn create_time_entry(
        &self,
        request: &TimeEntryCreationRequest,
    ) -> Result<TimeEntry, CreateError> {
        let response = self
            .client
            .post(format!(
                "{}/workspaces/{}/time_entries",
                self.api_url, request.wid
            ))
            .basic_auth(&self.api_token, Some("api_token"))
            .json(&TogglTimeEntryPost::from(request))
            .send()
            .await
            .map_err(|err| create_error(err, CreateError::Request))?;
        let response = error_for_status(response)
            .await
            .map_err(|(status, body)| CreateError::Status { status, body })?;
        let created = response
            .json::<TogglTimeEntry>()
            .await
            .map_err(|err| create_error(err, CreateError::Decode))?;

        Ok(created.into())
    }
}

/// エラーステータスの場合はステータスコードとレスポンスボディを返す。
async fn error_for_status(response: Response) -> Result<Response, (u16, String)> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = body_or_empty(response.text().await);
    Err((status.as_u16(), body))
}

/// レスポンスボディを読めなかった場合は空文字列とする。
fn body_or_empty(body: reqwest::Result<String>) -> String {
    body.unwrap_or_else(|err| {
        debug!("Failed to read error response body: {}", err);
        String::new()
    })
}

/// タイムアウトした場合は`CreateError::Timeout`、それ以外は`otherwise`で変換する。
fn create_error(
    err: reqwest::Error,
    otherwise: fn(reqwest::Error) -> CreateError,
) -> CreateError {
    if err.is_timeout() {
        CreateError::Timeout(err)
    } else {
        otherwise(err)
    }
}
