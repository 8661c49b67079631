//! End-to-end checks through the public library surface: a session writes
//! inspections, the process "restarts", and a new session recovers them.

use std::sync::{Arc, Mutex};

use scancheck_lib::{
    db::LogStore,
    export,
    inspection::Outcome,
    session::{CycleReport, EventSink, SessionController, SessionEvent},
    settings::ExportSettings,
    stats::AggregateCounters,
};

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<SessionEvent>>,
}

impl EventSink for CollectingSink {
    fn emit(&self, event: SessionEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn open_session(path: std::path::PathBuf) -> (SessionController, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::default());
    let controller = SessionController::new(LogStore::open(path), sink.clone());
    (controller, sink)
}

#[tokio::test]
async fn history_survives_restart_and_exports_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("scancheck.sqlite3");

    {
        let (controller, _sink) = open_session(db_path.clone());
        for (a, b) in [("ABC123", "ABC123"), ("ABC123", "XYZ999"), (" Q1 ", "Q1")] {
            let report = controller.inspect(a, b).await;
            assert!(matches!(report, CycleReport::Recorded { .. }));
        }
    }

    let (controller, sink) = open_session(db_path);
    let restored = controller.restore().await.unwrap();

    assert_eq!(
        restored.counters,
        AggregateCounters {
            total_inspections: 3,
            total_match: 2,
            total_mismatch: 1,
        }
    );
    let outcomes: Vec<Outcome> = restored.records.iter().map(|r| r.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::Match, Outcome::Mismatch, Outcome::Match]);
    assert_eq!(restored.records[2].code_a, "Q1");

    let restored_event = sink
        .events
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, SessionEvent::RecordsRestored { records } if records.len() == 3));
    assert!(restored_event);

    let export_settings = ExportSettings {
        date_format: "%d/%m/%Y".into(),
        ..ExportSettings::default()
    };
    let snapshot = controller.export_snapshot().await.unwrap();

    let workbook_path = dir.path().join("export.xlsx");
    assert_eq!(
        export::export_to_path(&snapshot, &workbook_path, &export_settings).unwrap(),
        3
    );
    assert!(std::fs::read(&workbook_path).unwrap().starts_with(b"PK"));

    let sheet_path = dir.path().join("export.csv");
    assert_eq!(
        export::export_to_path(&snapshot, &sheet_path, &export_settings).unwrap(),
        3
    );

    let sheet = std::fs::read_to_string(&sheet_path).unwrap();
    let results: Vec<&str> = sheet
        .lines()
        .skip(1)
        .map(|line| line.rsplit(',').next().unwrap())
        .collect();
    assert_eq!(results, vec!["OK", "NG", "OK"]);
}

#[tokio::test]
async fn reset_is_durable_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("scancheck.sqlite3");

    let last_id = {
        let (controller, _sink) = open_session(db_path.clone());
        controller.inspect("A", "A").await;
        controller.inspect("B", "B").await;
        controller.reset().await.unwrap();
        match controller.inspect("C", "D").await {
            CycleReport::Recorded { record, .. } => record.id,
            other => panic!("expected a recorded cycle, got {other:?}"),
        }
    };

    let (controller, _sink) = open_session(db_path);
    let restored = controller.restore().await.unwrap();
    assert_eq!(restored.records.len(), 1);
    assert_eq!(restored.records[0].id, last_id);
    assert_eq!(restored.counters.total_mismatch, 1);
    assert_eq!(restored.counters.total_inspections, 1);
}
