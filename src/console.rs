use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;

use crate::duplicate_command::DuplicationReport;
use crate::time_entry::TimeEntry;

/// Consoleにtime entryを表示するためのtrait。
pub trait ConsolePresenter {
    /// タイムエントリーを表示する。
    ///
    /// # Arguments
    ///
    /// * `time_entries` - 表示するタイムエントリー
    fn show_time_entries(&mut self, time_entries: &[TimeEntry]) -> Result<()>;

    /// 複製結果を表示する。
    fn show_report(&mut self, report: &DuplicationReport) -> Result<()>;
}

/// タイムエントリーをMarkdownのlist形式で表示する。
pub struct ConsoleMarkdownList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdownList<'a, W> {
    /// 新しい`ConsoleMarkdownList`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdownList<'a, W> {
    // time entryを開始時刻順にlist形式で表示する。
    fn show_time_entries(&mut self, time_entries: &[TimeEntry]) -> Result<()> {
        let mut sorted_entries = time_entries.to_vec();
        sorted_entries.sort_by_key(|entry| entry.start);

        for entry in sorted_entries {
            writeln!(self.writer, "- {}", entry_label(&entry))
                .with_context(|| format!("Failed to write time entry: {:?}", entry))?;
        }

        Ok(())
    }

    fn show_report(&mut self, report: &DuplicationReport) -> Result<()> {
        writeln!(
            self.writer,
            "Fetched: {}, Eligible: {}, Created: {}, Failed: {}",
            report.fetched,
            report.eligible,
            report.succeeded(),
            report.failed()
        )
        .context("Failed to write duplication summary")?;

        for outcome in &report.outcomes {
            let written = match &outcome.result {
                Ok(created) => writeln!(self.writer, "- {} -> {}", outcome.source_id, created.id),
                Err(err) => writeln!(self.writer, "- {} -> error: {}", outcome.source_id, err),
            };
            written.with_context(|| {
                format!("Failed to write outcome of entry {}", outcome.source_id)
            })?;
        }

        Ok(())
    }
}

/// タイムエントリーを1行で表す文字列を返す。
///
/// `HH:MM ~ HH:MM: description [tag, ...]`の形式とし、計測中の場合は終了時刻を`now`とする。
pub fn entry_label(entry: &TimeEntry) -> String {
    let start_str = entry
        .start
        .map(|start| start.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());
    let end_str = entry
        .stop
        .map(|stop| stop.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "now".to_string());
    let description = entry.description.as_deref().unwrap_or_default();

    match entry.tags.as_deref() {
        Some(tags) if !tags.is_empty() => format!(
            "{} ~ {}: {} [{}]",
            start_str,
            end_str,
            description,
            tags.join(", ")
        ),
        _ => format!("{} ~ {}: {}", start_str, end_str, description),
    }
}
