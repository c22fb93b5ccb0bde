use std::collections::HashMap;

use tempfile::TempDir;

use caskade_core::config::store::{SettingsStore, load_queue_file, save_queue_file};
use caskade_core::config::{QueueFile, Settings};
use caskade_core::queue::{ItemKind, NewItem, create_item};

#[test]
fn load_missing_returns_default_settings() {
    let temp = TempDir::new().unwrap();
    let store = SettingsStore::from_dir(temp.path().join("config"));

    let settings = store.load().unwrap();

    assert_eq!(settings, Settings::default());
}

#[test]
fn save_then_load_roundtrip() {
    let temp = TempDir::new().unwrap();
    let store = SettingsStore::from_dir(temp.path().join("config"));

    let settings = Settings {
        continue_on_error: false,
        skip_already_installed: false,
        parallel_installs: true,
    };
    store.save(&settings).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded, settings);
}

#[test]
fn queue_file_roundtrip_preserves_item_payloads() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("queue.json");

    let items = vec![
        create_item(NewItem::new(ItemKind::Formula, "git")),
        create_item(
            NewItem::new(
                ItemKind::Script {
                    commands: vec!["echo {{name}}".to_string()],
                    prompt_for_input: Default::default(),
                },
                "greet",
            )
            .with_description("Says hello"),
        ),
    ];
    let file = QueueFile {
        items,
        settings: Some(Settings::default()),
        values: HashMap::from([("name".to_string(), "caskade".to_string())]),
    };

    save_queue_file(&path, &file).unwrap();
    let loaded = load_queue_file(&path).unwrap();

    assert_eq!(loaded.items, file.items);
    assert_eq!(loaded.settings, file.settings);
    assert_eq!(loaded.values, file.values);
    match &loaded.items[1].kind {
        ItemKind::Script { commands, .. } => assert_eq!(commands[0], "echo {{name}}"),
        other => panic!("expected a script item, got {}", other.tag()),
    }
}

#[test]
fn load_queue_file_reports_the_path_on_parse_errors() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = load_queue_file(&path).unwrap_err();

    assert!(format!("{err:#}").contains("broken.json"));
}
