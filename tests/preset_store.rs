//! Integration tests for preset persistence across sources.

use eartrain::preset::{
    PresetDraft, PresetError, PresetKind, PresetSource, PresetStore, SaveScope, MemoryGlobalStore,
    DEFAULT_GLOBAL_CREDENTIAL,
};
use eartrain::rhythm::{RhythmPattern, Tempo};

fn draft(name: &str, notation: &str) -> PresetDraft {
    PresetDraft::new(name, Tempo::new(100).unwrap(), notation.parse().unwrap())
}

fn store(dir: &std::path::Path) -> PresetStore {
    PresetStore::new(dir).with_global(Box::new(MemoryGlobalStore::new()), DEFAULT_GLOBAL_CREDENTIAL)
}

#[test]
fn local_presets_survive_a_new_store() {
    let dir = tempfile::tempdir().unwrap();
    let kind = PresetKind::AdvancedSubdivisions;
    let saved = store(dir.path())
        .save(kind, draft("  Swing  ", "ASS 0.5:A"), SaveScope::Local)
        .unwrap();
    assert_eq!(saved.name, "Swing");
    assert!(saved.id.starts_with("local-"));

    let reopened = store(dir.path());
    let presets = reopened.list(kind);
    assert_eq!(presets.local, vec![saved.clone()]);
    let found = presets.find("Swing").unwrap();
    assert_eq!(found.pattern, "ASS 0.5:A".parse::<RhythmPattern>().unwrap());
    assert!(reopened.list(PresetKind::RhythmExplorer).local.is_empty());
}

#[test]
fn wrong_credential_is_distinct_from_other_failures() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = store(dir.path());
    let err = store
        .save(
            PresetKind::RhythmExplorer,
            draft("shared", "N N"),
            SaveScope::Global {
                credential: "guess".to_string(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, PresetError::CredentialRejected));
    assert_eq!(err.to_string(), "incorrect credential");

    let mut offline = PresetStore::new(dir.path());
    let err = offline
        .save(
            PresetKind::RhythmExplorer,
            draft("shared", "N N"),
            SaveScope::Global {
                credential: DEFAULT_GLOBAL_CREDENTIAL.to_string(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, PresetError::NotConfigured));
}

#[test]
fn listing_groups_every_source() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = store(dir.path());
    let kind = PresetKind::RhythmExplorer;
    let credential = SaveScope::Global {
        credential: DEFAULT_GLOBAL_CREDENTIAL.to_string(),
    };
    store.save(kind, draft("mine", "N.N."), SaveScope::Local).unwrap();
    store.save(kind, draft("ours", "NN"), credential.clone()).unwrap();

    let presets = store.list(kind);
    assert!(!presets.built_in.is_empty());
    assert_eq!(presets.global.len(), 1);
    assert_eq!(presets.global[0].source, PresetSource::Global);
    assert_eq!(presets.local.len(), 1);
    assert_eq!(presets.len(), presets.built_in.len() + 2);
    assert!(presets.built_in.iter().all(|p| p.source == PresetSource::BuiltIn));
}

#[test]
fn delete_only_touches_local() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let kind = PresetKind::AdvancedSubdivisions;
    assert!(!store.delete_local(kind, "builtin-quarters").unwrap());
    assert!(store.list(kind).find("builtin-quarters").is_some());
}

#[test]
fn corrupt_local_file_lists_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let kind = PresetKind::AdvancedSubdivisions;
    std::fs::write(store.local().path(kind), ": not yaml :").unwrap();
    let presets = store.list(kind);
    assert!(presets.local.is_empty());
    assert!(!presets.built_in.is_empty());
}
