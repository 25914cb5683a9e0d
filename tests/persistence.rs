//! Persistence tests: durable history must survive engine restarts.

use std::path::{Path, PathBuf};

use antirec::config::{EngineConfig, HistoryConfig, RelationSource};
use antirec::engine::Engine;
use antirec::history::UserId;
use antirec::paths::AntirecPaths;
use antirec::record::{Item, RecordKey};

fn key(s: &str) -> RecordKey {
    RecordKey::new(s).unwrap()
}

fn keys(names: &[&str]) -> Vec<RecordKey> {
    names.iter().map(|n| key(n)).collect()
}

fn item_keys(items: &[Item]) -> Vec<RecordKey> {
    items.iter().map(|item| item.key.clone()).collect()
}

fn user() -> UserId {
    UserId::new("reader").unwrap()
}

/// Write a four-record catalog with a chain A -> B -> C -> D.
fn fixture(dir: &Path) -> (PathBuf, PathBuf) {
    let catalog = dir.join("records.json");
    std::fs::write(
        &catalog,
        r#"[{"key": "A"}, {"key": "B"}, {"key": "C"}, {"key": "D"}]"#,
    )
    .unwrap();
    let relations = dir.join("relations.json");
    std::fs::write(
        &relations,
        r#"[
            {"subject": "A", "objects": ["B"]},
            {"subject": "B", "objects": ["C"]},
            {"subject": "C", "objects": ["D"]}
        ]"#,
    )
    .unwrap();
    (catalog, relations)
}

fn durable_config(dir: &Path, data_dir: Option<PathBuf>) -> EngineConfig {
    let (catalog, relations) = fixture(dir);
    EngineConfig {
        catalog: Some(catalog),
        relations: RelationSource::Json { path: relations },
        history: HistoryConfig::Durable { data_dir },
        ..Default::default()
    }
}

#[test]
fn history_survives_restart_and_initial_resumes() {
    let dir = tempfile::TempDir::new().unwrap();
    let data_dir = dir.path().join("history");

    {
        let engine = Engine::new(durable_config(dir.path(), Some(data_dir.clone())), None).unwrap();
        assert!(engine.info().durable_history);
        let mut nav = engine.navigator(user());
        assert_eq!(item_keys(&nav.initial().unwrap()), keys(&["B"]));
        assert_eq!(item_keys(&nav.next(&key("B")).unwrap()), keys(&["C"]));
        assert_eq!(item_keys(&nav.next(&key("C")).unwrap()), keys(&["D"]));
        nav.previous().unwrap();
        assert_eq!(engine.history().get(&user()).unwrap(), keys(&["A", "B"]));
    }

    // Reopen: the new engine sees the same history.
    let engine = Engine::new(durable_config(dir.path(), Some(data_dir)), None).unwrap();
    assert_eq!(engine.history().get(&user()).unwrap(), keys(&["A", "B"]));

    let mut nav = engine.navigator(user());
    let resumed = nav.initial().unwrap();
    assert_eq!(nav.current_frame().unwrap().anchor().key, key("B"));
    assert_eq!(item_keys(&resumed), keys(&["C"]));
    // Resuming from the newest entry does not duplicate it.
    assert_eq!(engine.history().get(&user()).unwrap(), keys(&["A", "B"]));
}

#[test]
fn durable_history_defaults_to_data_dir() {
    let dir = tempfile::TempDir::new().unwrap();
    let paths = AntirecPaths::rooted(dir.path().join("root"));

    {
        let engine = Engine::new(durable_config(dir.path(), None), Some(&paths)).unwrap();
        engine.navigator(user()).initial().unwrap();
    }

    assert!(paths.history_dir().join("history.redb").exists());
    let engine = Engine::new(durable_config(dir.path(), None), Some(&paths)).unwrap();
    assert_eq!(engine.history().last_seen(&user()).unwrap(), Some(key("A")));
}

#[test]
fn anti_recommendations_skip_persisted_history() {
    let dir = tempfile::TempDir::new().unwrap();
    let data_dir = dir.path().join("history");

    {
        let engine = Engine::new(durable_config(dir.path(), Some(data_dir.clone())), None).unwrap();
        let mut nav = engine.navigator(user());
        nav.initial().unwrap();
        nav.next(&key("B")).unwrap();
    }

    let engine = Engine::new(durable_config(dir.path(), Some(data_dir)), None).unwrap();
    // D has no edges; A and B are seen, D itself is excluded, so C is the fallback.
    let recs = engine.anti_recommendations(&key("D"), &user()).unwrap();
    let names: Vec<_> = recs.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(names, vec!["C"]);
    assert_eq!(recs[0].url, "https://en.wikipedia.org/wiki/C");
}
