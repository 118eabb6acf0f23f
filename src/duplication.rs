use chrono::{DateTime, Duration, Utc};

use crate::time_entry::{TimeEntry, TimeEntryCreationRequest};

/// 複製対象であることを示すタグ。
pub const PUBLIC_TAG: &str = "public";

/// 日数の差分として指定できる絶対値の上限。
pub const MAX_DELTA_DAYS: i64 = 36_500;

/// 複製元の日付と、複製時に開始時刻をずらす量。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DuplicationWindow {
    pub source_date: DateTime<Utc>,
    pub shift: Duration,
}

/// 複製元の日付と開始時刻をずらす量を計算する。
///
/// 差分はそれぞれ`±MAX_DELTA_DAYS`に丸めてから計算する。
/// 複製元の日付が表現できる範囲を超える場合は`now`をそのまま使う。
///
/// # Arguments
///
/// * `now` - 基準となる時刻
/// * `start_delta` - 基準時刻から複製元の日付までの日数
/// * `end_delta` - 基準時刻から複製先の日付までの日数
pub fn compute_window(now: DateTime<Utc>, start_delta: i64, end_delta: i64) -> DuplicationWindow {
    let start_delta = start_delta.clamp(-MAX_DELTA_DAYS, MAX_DELTA_DAYS);
    let end_delta = end_delta.clamp(-MAX_DELTA_DAYS, MAX_DELTA_DAYS);

    DuplicationWindow {
        source_date: now
            .checked_add_signed(Duration::days(start_delta))
            .unwrap_or(now),
        shift: Duration::days(end_delta - start_delta),
    }
}

/// 複製に必要な値が揃っていることを確認したタイムエントリー。
#[derive(Clone, Copy, Debug)]
pub struct EligibleEntry<'a> {
    entry: &'a TimeEntry,
    start: DateTime<Utc>,
    duration: i64,
}

impl<'a> EligibleEntry<'a> {
    /// 元のタイムエントリー。
    pub fn entry(&self) -> &'a TimeEntry {
        self.entry
    }
}

/// 開始時刻と終了済みの長さを持つタイムエントリーを返す。
///
/// タグは確認しないため、手動で選択したエントリーの複製にも利用できる。
pub fn completed(entry: &TimeEntry) -> Option<EligibleEntry<'_>> {
    let start = entry.start?;
    let duration = entry.duration.filter(|duration| *duration > 0)?;

    Some(EligibleEntry {
        entry,
        start,
        duration,
    })
}

/// タイムエントリーに`public`タグが付いているか。
pub fn has_public_tag(entry: &TimeEntry) -> bool {
    entry
        .tags
        .as_ref()
        .map_or(false, |tags| tags.iter().any(|tag| tag == PUBLIC_TAG))
}

/// 複製対象であれば検証済みのタイムエントリーを返す。
pub fn eligible(entry: &TimeEntry) -> Option<EligibleEntry<'_>> {
    if !has_public_tag(entry) {
        return None;
    }
    completed(entry)
}

/// タイムエントリーが複製対象か。
pub fn is_eligible(entry: &TimeEntry) -> bool {
    eligible(entry).is_some()
}

/// 複製対象のタイムエントリーだけを、元の順序のまま返す。
pub fn filter_eligible(entries: &[TimeEntry]) -> Vec<EligibleEntry<'_>> {
    entries.iter().filter_map(eligible).collect()
}

/// 複製対象のタイムエントリーから作成リクエストを作る。
///
/// 開始時刻だけを`shift`だけずらし、それ以外の値はそのまま引き継ぐ。
pub fn to_creation_request(
    eligible: &EligibleEntry<'_>,
    shift: Duration,
) -> TimeEntryCreationRequest {
    let entry = eligible.entry;
    TimeEntryCreationRequest {
        description: entry.description.clone().unwrap_or_default(),
        duration: eligible.duration,
        pid: entry.pid,
        start: eligible.start + shift,
        tags: entry.tags.clone().unwrap_or_default(),
        wid: entry.wid,
    }
}
