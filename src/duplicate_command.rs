use anyhow::{bail, Context, Result};
use futures::future::join_all;
use log::{debug, info, warn};

use crate::datetime::{local_day_range, Clock};
use crate::duplication::{
    compute_window, filter_eligible, is_eligible, to_creation_request, DuplicationWindow,
    MAX_DELTA_DAYS,
};
use crate::error::{CreateError, FetchError};
use crate::time_entry::{TimeEntry, TimeEntryCreationRequest};
use crate::toggl::TogglRepository;

/// `duplicate`と`select`サブコマンドで共通の、複製元と複製先の日付の引数。
#[derive(Debug, clap::Args)]
pub struct WindowArgs {
    #[clap(
        long = "from",
        help = "Days from today of the source date (e.g. -7)",
        allow_hyphen_values = true,
        parse(try_from_str = parse_delta),
    )]
    pub start_delta: i64,

    #[clap(
        long = "to",
        help = "Days from today of the destination date (e.g. 0)",
        allow_hyphen_values = true,
        parse(try_from_str = parse_delta),
    )]
    pub end_delta: i64,
}

/// 1件のタイムエントリーの複製結果。
#[derive(Debug)]
pub struct CreationOutcome {
    /// 複製元のタイムエントリーのID。
    pub source_id: i64,
    pub result: Result<TimeEntry, CreateError>,
}

/// 複製処理全体の結果。
#[derive(Debug, Default)]
pub struct DuplicationReport {
    /// 取得したタイムエントリーの件数。
    pub fetched: usize,
    /// 複製対象となったタイムエントリーの件数。
    pub eligible: usize,
    pub outcomes: Vec<CreationOutcome>,
}

impl DuplicationReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    /// 作成を試みたすべてのタイムエントリーが失敗したか。
    ///
    /// 何も作成しなかった場合は失敗とみなさない。
    pub fn is_total_failure(&self) -> bool {
        !self.outcomes.is_empty() && self.succeeded() == 0
    }

    /// 全件失敗の場合はエラーを返す。
    pub fn ensure_not_total_failure(&self) -> Result<()> {
        if self.is_total_failure() {
            bail!("All {} duplications failed", self.outcomes.len());
        }
        Ok(())
    }
}

pub struct DuplicateCommand<'a, T: TogglRepository, C: Clock> {
    toggl_client: &'a T,
    clock: &'a C,
}

impl<'a, T: TogglRepository, C: Clock> DuplicateCommand<'a, T, C> {
    /// 新しい`DuplicateCommand`を返す。
    ///
    /// # Arguments
    /// * `toggl_client` - Toggl APIと通信するためのリポジトリ
    /// * `clock` - 基準時刻を返す時計
    pub fn new(toggl_client: &'a T, clock: &'a C) -> Self {
        Self {
            toggl_client,
            clock,
        }
    }

    /// `duplicate`サブコマンドの処理を行う。
    ///
    /// 複製元の日付のうち`public`タグが付いた完了済みのタイムエントリーを、
    /// 開始時刻を複製先の日付までずらして作成する。
    /// 取得に失敗した場合は何も作成しない。
    /// 作成の失敗はタイムエントリーごとに結果へ記録し、他の作成は継続する。
    pub async fn run(&self, args: WindowArgs) -> Result<DuplicationReport, FetchError> {
        let window = compute_window(self.clock.now(), args.start_delta, args.end_delta);
        info!(
            "Duplicate entries of {} shifted by {} days",
            window.source_date,
            window.shift.num_days()
        );

        let entries = fetch_daily_time_entries(self.toggl_client, &window).await?;
        for skipped in entries.iter().filter(|entry| !is_eligible(entry)) {
            debug!("Skip time entry {}", skipped.id);
        }
        let eligible = filter_eligible(&entries);
        info!("Kept {} of {} time entries", eligible.len(), entries.len());

        let requests: Vec<(i64, TimeEntryCreationRequest)> = eligible
            .iter()
            .map(|entry| (entry.entry().id, to_creation_request(entry, window.shift)))
            .collect();
        let outcomes = submit_all(self.toggl_client, requests).await;

        Ok(DuplicationReport {
            fetched: entries.len(),
            eligible: eligible.len(),
            outcomes,
        })
    }
}

/// 複製元の日付を含むLocalタイムゾーンの1日分のタイムエントリーを取得する。
pub(crate) async fn fetch_daily_time_entries<T: TogglRepository>(
    toggl_client: &T,
    window: &DuplicationWindow,
) -> Result<Vec<TimeEntry>, FetchError> {
    let (start_at, end_at) = local_day_range(&window.source_date)?;
    info!("Fetching time entries from {} to {}", start_at, end_at);

    let entries = toggl_client.read_time_entries(&start_at, &end_at).await?;
    info!("Fetched {} time entries", entries.len());

    Ok(entries)
}

/// 作成リクエストを同時に送信し、すべての結果を待つ。
///
/// 結果は`requests`と同じ順序で返す。
pub(crate) async fn submit_all<T: TogglRepository>(
    toggl_client: &T,
    requests: Vec<(i64, TimeEntryCreationRequest)>,
) -> Vec<CreationOutcome> {
    let results = join_all(
        requests
            .iter()
            .map(|(_, request)| toggl_client.create_time_entry(request)),
    )
    .await;

    requests
        .iter()
        .zip(results)
        .map(|((source_id, _), result)| {
            match &result {
                Ok(created) => info!("Duplicated entry {} as {}", source_id, created.id),
                Err(err) => warn!("Failed to duplicate entry {}: {}", source_id, err),
            }
            CreationOutcome {
                source_id: *source_id,
                result,
            }
        })
        .collect()
}

/// 日数の差分をパースする。
pub(crate) fn parse_delta(s: &str) -> Result<i64> {
    let delta = s
        .parse::<i64>()
        .with_context(|| format!("Failed to parse days: {}", s))?;
    if delta.abs() > MAX_DELTA_DAYS {
        bail!("Days must be within ±{}: {}", MAX_DELTA_DAYS, delta);
    }
    Ok(delta)
}
