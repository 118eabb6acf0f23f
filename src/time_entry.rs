use chrono::{DateTime, Utc};

/// Togglから取得したタイムエントリー。
#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntry {
    pub id: i64,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub stop: Option<DateTime<Utc>>,
    /// 秒単位。計測中のエントリーは負の値になる。
    pub duration: Option<i64>,
    pub pid: Option<i64>,
    pub wid: i64,
    pub tags: Option<Vec<String>>,
}

/// 新しいタイムエントリーを作成するためのリクエスト。
#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntryCreationRequest {
    pub description: String,
    pub duration: i64,
    pub pid: Option<i64>,
    pub start: DateTime<Utc>,
    pub tags: Vec<String>,
    pub wid: i64,
}
