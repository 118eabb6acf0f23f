use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use log::info;

use crate::datetime::{local_day_range, Clock};
use crate::time_entry::TimeEntry;
use crate::toggl::TogglRepository;

/// 日毎の情報を出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct DailyArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Sets a custom date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    date: Option<DateTime<Utc>>,
}

pub struct DailyCommand<'a, T: TogglRepository, C: Clock> {
    toggl_client: &'a T,
    clock: &'a C,
}

impl<'a, T: TogglRepository, C: Clock> DailyCommand<'a, T, C> {
    /// 新しい`DailyCommand`を返す。
    ///
    /// # Arguments
    /// * `toggl_client` - Toggl APIと通信するためのリポジトリ
    /// * `clock` - 日付が指定されていない場合に利用する時計
    pub fn new(toggl_client: &'a T, clock: &'a C) -> Self {
        Self {
            toggl_client,
            clock,
        }
    }

    /// `daily`サブコマンドの処理を行う。
    ///
    /// Localタイムゾーンで指定された日付の00:00:00から始まる1日のタイムエントリーを取得する。
    /// 日付が指定されていない場合は、Localタイムゾーンで現在の日付を利用する。
    ///
    /// # Arguments
    ///
    /// * `daily` - `daily`サブコマンドの引数
    pub async fn run(&self, daily: DailyArgs) -> Result<Vec<TimeEntry>> {
        let date = daily.date.unwrap_or_else(|| self.clock.now());
        let (start_at, end_at) =
            local_day_range(&date).context("Failed to calculate the local day")?;
        info!("Start at: {}, End at: {}", start_at, end_at);

        let time_entries = self
            .toggl_client
            .read_time_entries(&start_at, &end_at)
            .await
            .context("Failed to retrieve time entries")?;

        info!("Time entries retrieved successfully.");

        Ok(time_entries)
    }
}

/// 日付をパースする。
fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let naive_date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Failed to parse date: {}", s))?;
    let naive_datetime = naive_date
        .and_hms_opt(12, 0, 0)
        .context("Failed to set hour, minute, and second")?;
    let datetime = Local
        .from_local_datetime(&naive_datetime)
        .earliest()
        .context("Failed to convert to DateTime<Local>")?
        .to_utc();

    Ok(datetime)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
    use rstest::rstest;

    use super::{parse_date, DailyArgs, DailyCommand};
    use crate::datetime::{local_day_range, FixedClock};
    use crate::error::FetchError;
    use crate::toggl::MockTogglRepository;

    #[tokio::test]
    async fn test_daily_command_no_date() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        let (expected_start, _) = local_day_range(&clock.0).unwrap();
        let args = DailyArgs { date: None };
        let mut toggl = MockTogglRepository::new();
        toggl
            .expect_read_time_entries()
            .withf(move |start_at, _| *start_at == expected_start)
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let command = DailyCommand::new(&toggl, &clock);
        let result = command.run(args).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    #[rstest]
    #[case(Local::now())]
    #[case(Local.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap())]
    async fn test_daily_command_with_date(#[case] date: DateTime<Local>) {
        let date_utc = date.to_utc();
        let daily = DailyArgs {
            date: Some(date_utc),
        };
        let clock = FixedClock(Utc::now());
        let mut toggl = MockTogglRepository::new();
        toggl
            .expect_read_time_entries()
            .withf(move |start_at, end_at| *start_at <= date_utc && date_utc < *end_at)
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let command = DailyCommand::new(&toggl, &clock);
        let result = command.run(daily).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_daily_command_fetch_error() {
        let clock = FixedClock(Utc::now());
        let mut toggl = MockTogglRepository::new();
        toggl.expect_read_time_entries().returning(|_, _| {
            Err(FetchError::Status {
                status: 401,
                body: String::new(),
            })
        });

        let command = DailyCommand::new(&toggl, &clock);
        let result = command.run(DailyArgs { date: None }).await;

        assert!(result.is_err());
    }

    #[rstest]
    #[case("2024-02-29")]
    #[case("2000-01-01")]
    fn test_parse_date(#[case] input: &str) {
        let parsed = parse_date(input).unwrap();

        assert_eq!(
            parsed.with_timezone(&Local).date_naive(),
            NaiveDate::parse_from_str(input, "%Y-%m-%d").unwrap()
        );
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("2024/02/29").is_err());
    }
}
