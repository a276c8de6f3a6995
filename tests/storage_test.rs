use achot::prefs::{THEME_KEY, Theme, UiState};
use achot::storage::{FileStore, KeyValueStore, MemoryStore};
use tempfile::tempdir;

#[test]
fn memory_store_put_get_delete() {
    let store = MemoryStore::new();
    assert_eq!(store.get("k").unwrap(), None);
    store.put("k", "v").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    assert!(store.contains("k"));
    store.delete("k").unwrap();
    assert!(!store.contains("k"));
    store.delete("missing").unwrap();
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("store.bin.gz");

    {
        let store = FileStore::open(&path).unwrap();
        store.put("achot.draft", "{\"rows\":[]}").unwrap();
        store.put("other", "x").unwrap();
        store.delete("other").unwrap();
    }
    assert!(path.exists());

    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(
        reopened.get("achot.draft").unwrap().as_deref(),
        Some("{\"rows\":[]}")
    );
    assert_eq!(reopened.get("other").unwrap(), None);
}

#[test]
fn file_store_starts_empty_without_a_file() {
    let dir = tempdir().unwrap();
    let store = FileStore::open(dir.path().join("absent.bin.gz")).unwrap();
    assert_eq!(store.get("anything").unwrap(), None);
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.bin.gz");
    std::fs::write(&path, b"definitely not gzip").unwrap();
    assert!(FileStore::open(&path).is_err());
}

#[test]
fn theme_defaults_to_light_and_persists() {
    let store = MemoryStore::new();
    let mut ui = UiState::load(&store).unwrap();
    assert_eq!(ui.theme, Theme::Light);
    assert!(ui.online);

    ui.set_theme(ui.theme.toggled(), &store).unwrap();
    assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    assert_eq!(UiState::load(&store).unwrap().theme, Theme::Dark);
}

#[test]
fn unknown_theme_falls_back_to_light() {
    let store = MemoryStore::new();
    store.put(THEME_KEY, "sepia").unwrap();
    assert_eq!(UiState::load(&store).unwrap().theme, Theme::Light);
}
