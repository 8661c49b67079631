//! Line-oriented input surface for a scanner that types codes followed by Enter.
//!
//! Plain lines alternate between first and second reading. Lines starting with
//! `:` are commands; a reading that itself starts with `:` is entered as `::`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::debug;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::{export, settings::ExportSettings};

use super::{SessionController, SessionEvent, SessionPhase};

pub const HELP_TEXT: &str = "Scan the first code, then the second code.\n\
Commands: :restore  :stats  :export [PATH]  :reset  :help  :quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCommand {
    Reading(String),
    Restore,
    Stats,
    Export(Option<PathBuf>),
    Reset,
    Help,
    Quit,
}

impl ScanCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(rest) = line.strip_prefix(':') else {
            return Ok(ScanCommand::Reading(line.to_string()));
        };
        if rest.starts_with(':') {
            return Ok(ScanCommand::Reading(rest.to_string()));
        }

        let mut parts = rest.trim().splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let argument = parts.next().map(str::trim).filter(|arg| !arg.is_empty());

        let command = match name {
            "restore" => ScanCommand::Restore,
            "stats" => ScanCommand::Stats,
            "export" => ScanCommand::Export(argument.map(PathBuf::from)),
            "reset" => ScanCommand::Reset,
            "help" | "?" => ScanCommand::Help,
            "quit" | "q" | "exit" => ScanCommand::Quit,
            other => bail!("unknown command :{other}"),
        };
        Ok(command)
    }
}

/// Writes the current store contents to `path` and reports the row count
/// through the controller's event sink.
///
/// Returns `Ok(None)` when the snapshot could not be read; that failure has
/// already been reported by the controller.
pub async fn export_snapshot_to(
    controller: &SessionController,
    path: &Path,
    export_settings: &ExportSettings,
) -> Result<Option<usize>> {
    let Ok(records) = controller.export_snapshot().await else {
        return Ok(None);
    };

    let count = export::export_to_path(&records, path, export_settings)?;
    controller.events().emit(SessionEvent::Notice {
        message: format!("Exported {count} inspections to {}", path.display()),
    });
    Ok(Some(count))
}

/// Emits the running totals followed by the number of stored records.
pub async fn report_stats(controller: &SessionController) {
    let counters = controller.counters().await;
    controller
        .events()
        .emit(SessionEvent::CountersChanged { counters });
    if let Ok(stored) = controller.record_count().await {
        controller.events().emit(SessionEvent::Notice {
            message: format!("Records stored: {stored}"),
        });
    }
}

/// Feeds lines from `reader` into the controller until EOF or `:quit`.
///
/// No failure ends the loop: store problems are reported by the controller,
/// and bad commands or export errors become notices.
pub async fn run_scan_loop<R>(
    controller: &SessionController,
    export_settings: &ExportSettings,
    reader: R,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let events = controller.events().clone();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await.context("failed to read scan input")? {
        let command = match ScanCommand::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                events.emit(SessionEvent::Notice {
                    message: format!("{err}. Type :help for commands."),
                });
                continue;
            }
        };
        debug!("scan input: {command:?}");

        match command {
            ScanCommand::Reading(raw) => {
                if controller.state().await.phase == SessionPhase::AwaitingSecond {
                    controller.submit_second(&raw).await;
                } else {
                    controller.submit_first(&raw).await;
                }
            }
            ScanCommand::Restore => {
                // failures are already surfaced as store-failure events
                let _ = controller.restore().await;
            }
            ScanCommand::Stats => report_stats(controller).await,
            ScanCommand::Export(path) => {
                let path =
                    path.unwrap_or_else(|| PathBuf::from(&export_settings.file_name));
                if let Err(err) = export_snapshot_to(controller, &path, export_settings).await {
                    events.emit(SessionEvent::Notice {
                        message: format!("Export failed: {err:#}"),
                    });
                }
            }
            ScanCommand::Reset => {
                let _ = controller.reset().await;
            }
            ScanCommand::Help => events.emit(SessionEvent::Notice {
                message: HELP_TEXT.to_string(),
            }),
            ScanCommand::Quit => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{db::LogStore, session::test_support::RecordingSink, stats::AggregateCounters};

    fn controller(dir: &tempfile::TempDir) -> (SessionController, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let store = LogStore::open(dir.path().join("scan.sqlite3"));
        (SessionController::new(store, sink.clone()), sink)
    }

    #[test]
    fn plain_lines_are_readings() {
        assert_eq!(
            ScanCommand::parse("ABC123\r\n").unwrap(),
            ScanCommand::Reading("ABC123".into())
        );
        assert_eq!(ScanCommand::parse("").unwrap(), ScanCommand::Reading(String::new()));
    }

    #[test]
    fn double_colon_escapes_a_reading() {
        assert_eq!(
            ScanCommand::parse("::X:1").unwrap(),
            ScanCommand::Reading(":X:1".into())
        );
    }

    #[test]
    fn commands_parse_with_optional_argument() {
        assert_eq!(ScanCommand::parse(":restore").unwrap(), ScanCommand::Restore);
        assert_eq!(ScanCommand::parse(":export").unwrap(), ScanCommand::Export(None));
        assert_eq!(
            ScanCommand::parse(":export  out/day 1.csv ").unwrap(),
            ScanCommand::Export(Some(PathBuf::from("out/day 1.csv")))
        );
        assert_eq!(ScanCommand::parse(":q").unwrap(), ScanCommand::Quit);
        assert!(ScanCommand::parse(":frobnicate").is_err());
    }

    #[tokio::test]
    async fn lines_alternate_between_first_and_second_reading() {
        let dir = tempfile::tempdir().unwrap();
        let (controller, _sink) = controller(&dir);

        let input: &[u8] = b"ABC123\nABC123\nABC123\nXYZ999\n\nX\n:quit\nIGNORED\n";
        run_scan_loop(&controller, &ExportSettings::default(), input)
            .await
            .unwrap();

        assert_eq!(
            controller.counters().await,
            AggregateCounters {
                total_inspections: 2,
                total_match: 1,
                total_mismatch: 1,
            }
        );
        assert_eq!(controller.export_snapshot().await.unwrap().len(), 2);
        assert_eq!(controller.state().await.phase, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn unknown_command_does_not_end_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let (controller, sink) = controller(&dir);

        let input: &[u8] = b":bogus\nA\nA\n:stats\n";
        run_scan_loop(&controller, &ExportSettings::default(), input)
            .await
            .unwrap();

        assert_eq!(
            sink.names(),
            vec![
                "notice",
                "inspection-classified",
                "record-appended",
                "counters-changed",
                "counters-changed",
                "notice",
            ]
        );
        assert_eq!(controller.counters().await.total_match, 1);
    }

    #[tokio::test]
    async fn export_and_reset_commands() {
        let dir = tempfile::tempdir().unwrap();
        let (controller, _sink) = controller(&dir);
        let out = dir.path().join("sheet.csv");
        let workbook = dir.path().join("sheet.xlsx");

        let script = format!(
            "Q1\nQ1\n:export {}\n:export {}\n:reset\n",
            out.display(),
            workbook.display()
        );
        run_scan_loop(&controller, &ExportSettings::default(), script.as_bytes())
            .await
            .unwrap();

        let sheet = std::fs::read_to_string(&out).unwrap();
        assert_eq!(sheet.lines().count(), 2);
        assert!(sheet.contains("Q1,Q1,OK"));
        assert!(std::fs::read(&workbook).unwrap().starts_with(b"PK"));
        assert!(controller.export_snapshot().await.unwrap().is_empty());
        assert_eq!(controller.counters().await, AggregateCounters::default());
    }
}
