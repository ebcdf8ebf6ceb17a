/// History persistence tests against the file-backed store.
///
/// Each test runs in its own temporary directory, so the store on disk is
/// the only shared state between a "session" and the next.
use mailsort::analysis::{AnalysisResult, Category};
use mailsort::history::{HISTORY_CAPACITY, HISTORY_KEY, HistoryStore};
use mailsort::stats;
use mailsort::storage::{FileStorage, Storage};

fn result(n: usize) -> AnalysisResult {
    AnalysisResult {
        category: if n % 2 == 0 {
            Category::Productive
        } else {
            Category::Unproductive
        },
        reason: Some(format!("motivo {n}")),
        created_at: Some("2025-03-10T12:00:00".to_string()),
        ..Default::default()
    }
}

// ===========================================================================
// 1. Bounded, newest-first
// ===========================================================================

#[test]
fn length_is_min_of_submissions_and_capacity() {
    for submitted in [0, 1, 9, 10, 11, 25] {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::hydrate(FileStorage::new(dir.path()));
        for n in 0..submitted {
            store.prepend(result(n)).unwrap();
        }
        assert_eq!(store.len(), submitted.min(HISTORY_CAPACITY));
    }
}

#[test]
fn newest_first_and_oldest_evicted() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = HistoryStore::hydrate(FileStorage::new(dir.path()));
    for n in 0..12 {
        store.prepend(result(n)).unwrap();
    }

    let reasons: Vec<_> = store
        .current()
        .iter()
        .map(|r| r.reason.clone().unwrap())
        .collect();
    assert_eq!(reasons.first().unwrap(), "motivo 11");
    assert_eq!(reasons.last().unwrap(), "motivo 2");
}

// ===========================================================================
// 2. Survives a restart
// ===========================================================================

#[test]
fn rehydrate_restores_identical_history() {
    let dir = tempfile::tempdir().unwrap();
    let before = {
        let mut store = HistoryStore::hydrate(FileStorage::new(dir.path()));
        for n in 0..4 {
            store.prepend(result(n)).unwrap();
        }
        store.current().to_vec()
    };

    let store = HistoryStore::hydrate(FileStorage::new(dir.path()));
    assert_eq!(store.current(), before.as_slice());
}

#[test]
fn snapshot_uses_wire_labels_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    let mut store = HistoryStore::hydrate(&storage);
    store
        .prepend(AnalysisResult {
            category: Category::Productive,
            original_text: Some("Preciso de ajuda".to_string()),
            ..Default::default()
        })
        .unwrap();

    let raw = storage.get(HISTORY_KEY).unwrap().unwrap();
    assert!(raw.contains("\"Produtivo\""));
    assert!(raw.contains("\"originalText\""));
}

#[test]
fn corrupt_snapshot_starts_empty_and_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    storage.set(HISTORY_KEY, "{not json").unwrap();

    let mut store = HistoryStore::hydrate(&storage);
    assert!(store.is_empty());

    store.prepend(result(0)).unwrap();
    let store = HistoryStore::hydrate(&storage);
    assert_eq!(store.len(), 1);
}

// ===========================================================================
// 3. Clear
// ===========================================================================

#[test]
fn clear_removes_key_and_stats_go_to_zero() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    let mut store = HistoryStore::hydrate(&storage);
    store.prepend(result(0)).unwrap();
    assert!(storage.key_path(HISTORY_KEY).exists());

    store.clear().unwrap();
    assert!(!storage.key_path(HISTORY_KEY).exists());

    let report = stats::build_report(store.current());
    assert_eq!(report.summary.total, 0);
    assert_eq!(report.summary.productive_pct, 0);
    assert_eq!(report.summary.unproductive_pct, 0);

    let store = HistoryStore::hydrate(&storage);
    assert!(store.is_empty());
}

// ===========================================================================
// 4. Stats follow history
// ===========================================================================

#[test]
fn stats_follow_the_stored_history() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = HistoryStore::hydrate(FileStorage::new(dir.path()));
    for label in ["Produtivo", "Produtivo", "Produtivo", "Improdutivo", "Erro"] {
        store
            .prepend(AnalysisResult {
                category: Category::from(label.to_string()),
                ..Default::default()
            })
            .unwrap();
    }

    let report = stats::build_report(store.current());
    assert_eq!(report.summary.productive, 3);
    assert_eq!(report.summary.unproductive, 2);
    assert_eq!(report.summary.productive_pct, 60);
    assert_eq!(report.insight, stats::Insight::Good);
}

// ===========================================================================
// 5. Two writers on one directory
// ===========================================================================

#[test]
fn cli_and_dashboard_stores_do_not_overwrite_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let mut dashboard = HistoryStore::hydrate(FileStorage::new(dir.path()));
    let mut cli = HistoryStore::hydrate(FileStorage::new(dir.path()));

    let mut from_cli = result(1);
    from_cli.reason = Some("from cli".to_string());
    cli.prepend(from_cli).unwrap();

    let mut from_dashboard = result(2);
    from_dashboard.reason = Some("from dashboard".to_string());
    dashboard.prepend(from_dashboard).unwrap();

    let reasons: Vec<_> = HistoryStore::hydrate(FileStorage::new(dir.path()))
        .current()
        .iter()
        .map(|r| r.reason.clone().unwrap())
        .collect();
    assert_eq!(reasons, vec!["from dashboard", "from cli"]);
    assert_eq!(dashboard.current().len(), 2);
}

#[test]
fn reload_sees_a_reset_from_another_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut dashboard = HistoryStore::hydrate(FileStorage::new(dir.path()));
    dashboard.prepend(result(0)).unwrap();

    let mut cli = HistoryStore::hydrate(FileStorage::new(dir.path()));
    cli.clear().unwrap();

    dashboard.reload();
    assert!(dashboard.is_empty());
}
