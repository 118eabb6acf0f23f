use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};

use crate::error::FetchError;

/// 現在時刻を返すためのtrait。
pub trait Clock {
    /// 現在のUTC時間を取得する。
    fn now(&self) -> DateTime<Utc>;
}

/// システム時計を利用する`Clock`。
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 指定した時刻を返し続ける`Clock`。
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// 指定された時刻を含むLocalタイムゾーンの1日の範囲を返す。
///
/// 範囲は`[00:00:00, 翌日00:00:00)`とする。
/// 夏時間の切り替え日は23時間または25時間になる。
///
/// # Arguments
///
/// * `date` - 範囲に含まれる時刻
pub fn local_day_range(
    date: &DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), FetchError> {
    let day = date.with_timezone(&Local).date_naive();
    let next_day = day.succ_opt().ok_or(FetchError::DayBoundary(day))?;

    Ok((start_of_local_day(day)?, start_of_local_day(next_day)?))
}

/// Localタイムゾーンで日付の00:00:00を返す。
fn start_of_local_day(day: NaiveDate) -> Result<DateTime<Utc>, FetchError> {
    let midnight = day.and_hms_opt(0, 0, 0).ok_or(FetchError::DayBoundary(day))?;
    // 00:00が存在しない地域では最初に存在する時刻まで進める
    (0..=2)
        .find_map(|hour| {
            Local
                .from_local_datetime(&(midnight + Duration::hours(hour)))
                .earliest()
        })
        .map(|start| start.to_utc())
        .ok_or(FetchError::DayBoundary(day))
}
