use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, MultiSelect};
use log::info;
#[cfg(test)]
use mockall::automock;

use crate::console::entry_label;
use crate::datetime::Clock;
use crate::duplicate_command::{fetch_daily_time_entries, submit_all, DuplicationReport, WindowArgs};
use crate::duplication::{completed, compute_window, has_public_tag, to_creation_request};
use crate::time_entry::{TimeEntry, TimeEntryCreationRequest};
use crate::toggl::TogglRepository;

/// 複製するタイムエントリーを利用者に選ばせるためのtrait。
#[cfg_attr(test, automock)]
pub trait EntrySelector {
    /// 選択されたタイムエントリーのindexを返す。
    ///
    /// # Arguments
    ///
    /// * `labels` - 選択肢として表示する文字列
    /// * `defaults` - 最初から選択しておくか
    fn select(&mut self, labels: &[String], defaults: &[bool]) -> Result<Vec<usize>>;
}

/// ターミナル上のチェックボックスで選択させる`EntrySelector`。
pub struct TerminalSelector;

impl EntrySelector for TerminalSelector {
    fn select(&mut self, labels: &[String], defaults: &[bool]) -> Result<Vec<usize>> {
        MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt("Select time entries to duplicate (space to toggle, enter to confirm)")
            .items(labels)
            .defaults(defaults)
            .interact()
            .context("Failed to read selection from terminal")
    }
}

pub struct SelectCommand<'a, T: TogglRepository, C: Clock, S: EntrySelector> {
    toggl_client: &'a T,
    clock: &'a C,
    selector: S,
}

impl<'a, T: TogglRepository, C: Clock, S: EntrySelector> SelectCommand<'a, T, C, S> {
    /// 新しい`SelectCommand`を返す。
    pub fn new(toggl_client: &'a T, clock: &'a C, selector: S) -> Self {
        Self {
            toggl_client,
            clock,
            selector,
        }
    }

    /// `select`サブコマンドの処理を行う。
    ///
    /// 複製元の日付の完了済みタイムエントリーを一覧表示し、選ばれたものだけを複製する。
    /// `public`タグが付いたタイムエントリーは最初から選択しておく。
    pub async fn run(&mut self, args: WindowArgs) -> Result<DuplicationReport> {
        let window = compute_window(self.clock.now(), args.start_delta, args.end_delta);
        let entries = fetch_daily_time_entries(self.toggl_client, &window)
            .await
            .context("Failed to retrieve time entries")?;

        let candidates: Vec<_> = entries.iter().filter_map(completed).collect();
        if candidates.is_empty() {
            info!("No completed time entries to select");
            return Ok(DuplicationReport {
                fetched: entries.len(),
                ..Default::default()
            });
        }

        let labels: Vec<String> = candidates
            .iter()
            .map(|candidate| entry_label(candidate.entry()))
            .collect();
        let defaults: Vec<bool> = candidates
            .iter()
            .map(|candidate| has_public_tag(candidate.entry()))
            .collect();
        let mut selected = self.selector.select(&labels, &defaults)?;
        selected.sort_unstable();
        selected.dedup();
        info!("Selected {} of {} time entries", selected.len(), candidates.len());

        let requests: Vec<(i64, TimeEntryCreationRequest)> = selected
            .iter()
            .filter_map(|index| candidates.get(*index))
            .map(|candidate| {
                let source: &TimeEntry = candidate.entry();
                (source.id, to_creation_request(candidate, window.shift))
            })
            .collect();
        let eligible = requests.len();
        let outcomes = submit_all(self.toggl_client, requests).await;

        Ok(DuplicationReport {
            fetched: entries.len(),
            eligible,
            outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{MockEntrySelector, SelectCommand};
    use crate::datetime::FixedClock;
    use crate::duplicate_command::WindowArgs;
    use crate::duplication::tests::entry;
    use crate::time_entry::TimeEntry;
    use crate::toggl::MockTogglRepository;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).unwrap())
    }

    fn args() -> WindowArgs {
        WindowArgs {
            start_delta: -1,
            end_delta: 0,
        }
    }

    /// 選択したエントリーだけが、タグに関係なく複製されることを確認する。
    #[tokio::test]
    async fn test_select_duplicates_chosen_entries() {
        let mut toggl = MockTogglRepository::new();
        toggl.expect_read_time_entries().returning(|_, _| {
            Ok(vec![
                entry(1, Some(&["public"]), Some(600)),
                entry(2, Some(&["public"]), Some(-1)),
                entry(3, None, Some(1200)),
            ])
        });
        toggl
            .expect_create_time_entry()
            .withf(|request| request.duration == 1200)
            .times(1)
            .returning(|request| {
                Ok(TimeEntry {
                    id: 300,
                    ..entry(3, None, Some(request.duration))
                })
            });
        let mut selector = MockEntrySelector::new();
        selector
            .expect_select()
            .withf(|labels, defaults| labels.len() == 2 && defaults == [true, false])
            .times(1)
            .returning(|_, _| Ok(vec![1]));

        let clock = clock();
        let mut command = SelectCommand::new(&toggl, &clock, selector);
        let report = command.run(args()).await.unwrap();

        assert_eq!(report.fetched, 3);
        assert_eq!(report.eligible, 1);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.outcomes[0].source_id, 3);
    }

    #[tokio::test]
    async fn test_select_shifts_start() {
        let source = entry(1, Some(&["public"]), Some(600));
        let expected_start = source.start.unwrap() + Duration::days(1);
        let mut toggl = MockTogglRepository::new();
        toggl
            .expect_read_time_entries()
            .returning(move |_, _| Ok(vec![source.clone()]));
        toggl
            .expect_create_time_entry()
            .withf(move |request| request.start == expected_start)
            .times(1)
            .returning(|_| Ok(entry(9, None, Some(600))));
        let mut selector = MockEntrySelector::new();
        selector
            .expect_select()
            .returning(|_, _| Ok(vec![0, 0]));

        let clock = clock();
        let mut command = SelectCommand::new(&toggl, &clock, selector);
        let report = command.run(args()).await.unwrap();

        assert_eq!(report.outcomes.len(), 1);
    }

    #[tokio::test]
    async fn test_select_nothing() {
        let mut toggl = MockTogglRepository::new();
        toggl
            .expect_read_time_entries()
            .returning(|_, _| Ok(vec![entry(1, Some(&["public"]), Some(600))]));
        toggl.expect_create_time_entry().never();
        let mut selector = MockEntrySelector::new();
        selector.expect_select().returning(|_, _| Ok(vec![]));

        let clock = clock();
        let mut command = SelectCommand::new(&toggl, &clock, selector);
        let report = command.run(args()).await.unwrap();

        assert!(report.outcomes.is_empty());
        assert!(!report.is_total_failure());
    }

    /// 完了済みのエントリーがない場合は選択画面を表示しない。
    #[tokio::test]
    async fn test_select_without_candidates() {
        let mut toggl = MockTogglRepository::new();
        toggl
            .expect_read_time_entries()
            .returning(|_, _| Ok(vec![entry(1, Some(&["public"]), None)]));
        toggl.expect_create_time_entry().never();
        let mut selector = MockEntrySelector::new();
        selector.expect_select().never();

        let clock = clock();
        let mut command = SelectCommand::new(&toggl, &clock, selector);
        let report = command.run(args()).await.unwrap();

        assert_eq!(report.fetched, 1);
        assert!(report.outcomes.is_empty());
    }
}
