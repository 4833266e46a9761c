//! Integration tests for the SettingsStore:
//! - defaults when no file exists
//! - persisting only changed (delta) fields
//! - reloading after external file modification

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use settings::{Settings, SettingsError, SettingsStore};

fn unique_temp_path(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("settings_store_test_{name}_{nanos}.ron"))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Playback {
    muted: bool,
    volume: f32,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            muted: false,
            volume: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Deck {
    track: String,
    playback: Playback,
}

impl Default for Deck {
    fn default() -> Self {
        Self {
            track: "audio/theme.ogg".to_string(),
            playback: Playback::default(),
        }
    }
}

impl Settings for Deck {
    const SECTION: &'static str = "deck";
}

fn keys(value: &ron::Value) -> Vec<String> {
    let ron::Value::Map(map) = value else {
        panic!("expected a map, got {value:?}");
    };
    map.iter()
        .filter_map(|(k, _)| match k {
            ron::Value::String(s) => Some(s.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn defaults_apply_without_a_file() {
    let path = unique_temp_path("defaults");
    let store = SettingsStore::builder()
        .with_settings_file(path.clone())
        .build()
        .expect("build store");
    store.register::<Deck>().expect("register");

    assert_eq!(*store.get::<Deck>().expect("get"), Deck::default());
    assert!(!path.exists(), "nothing is written before the first update");
}

#[test]
fn update_persists_only_the_delta() {
    let path = unique_temp_path("delta");
    let store = SettingsStore::builder()
        .with_settings_file(path.clone())
        .build()
        .expect("build store");
    store.register::<Deck>().expect("register");

    store
        .update::<Deck, _>(|deck| deck.playback.muted = true)
        .expect("update");

    let content = fs::read_to_string(&path).expect("read delta file");
    let root: HashMap<String, ron::Value> = ron::from_str(&content).expect("parse delta");
    let deck = root.get("deck").expect("deck section");

    assert_eq!(keys(deck), vec!["playback".to_string()]);
    let ron::Value::Map(section) = deck else {
        unreachable!()
    };
    let playback = section
        .iter()
        .find(|(k, _)| matches!(k, ron::Value::String(s) if s == "playback"))
        .map(|(_, v)| v)
        .unwrap();
    assert_eq!(keys(playback), vec!["muted".to_string()]);

    let effective = store.get::<Deck>().expect("get");
    assert!(effective.playback.muted);
    assert_eq!(effective.track, "audio/theme.ogg");

    let _ = fs::remove_file(path);
}

#[test]
fn reverting_to_defaults_drops_the_section() {
    let path = unique_temp_path("revert");
    let store = SettingsStore::builder()
        .with_settings_file(path.clone())
        .build()
        .expect("build store");
    store.register::<Deck>().expect("register");

    store
        .update::<Deck, _>(|deck| deck.track = "audio/other.ogg".into())
        .expect("first update");
    store
        .update::<Deck, _>(|deck| deck.track = "audio/theme.ogg".into())
        .expect("revert");

    let content = fs::read_to_string(&path).expect("read delta file");
    let root: HashMap<String, ron::Value> = ron::from_str(&content).expect("parse delta");
    assert!(root.is_empty());

    let _ = fs::remove_file(path);
}

#[test]
fn reload_applies_external_changes() {
    let path = unique_temp_path("reload");
    let store = SettingsStore::builder()
        .with_settings_file(path.clone())
        .build()
        .expect("build");
    store.register::<Deck>().expect("register");

    let external = r#"
    {
        "deck": {
            "playback": { "volume": 0.25 }
        }
    }
    "#;
    fs::write(&path, external).expect("write external delta");
    store.reload().expect("reload");

    let deck = store.get::<Deck>().expect("get after reload");
    assert_eq!(deck.playback.volume, 0.25);
    assert!(!deck.playback.muted);
    assert_eq!(deck.track, "audio/theme.ogg");

    let _ = fs::remove_file(path);
}

#[test]
fn double_registration_and_unknown_sections_fail() {
    let store = SettingsStore::builder()
        .with_settings_file(unique_temp_path("errors"))
        .build()
        .expect("build");

    assert!(matches!(
        store.get::<Deck>(),
        Err(SettingsError::NotRegistered("deck"))
    ));
    assert!(store.try_get::<Deck>().expect("try_get").is_none());

    store.register::<Deck>().expect("register");
    assert!(matches!(
        store.register::<Deck>(),
        Err(SettingsError::AlreadyRegistered("deck"))
    ));
}
