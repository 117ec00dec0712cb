use liveroute::echo::static_catalog;
use liveroute::generator::GeneratorConfig;
use liveroute::hot_reload::{reload_from_file, watch_spec};
use liveroute::LiveApi;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::specs::{GADGETS_YAML, WIDGETS_YAML};
use common::temp_files;

#[test]
fn test_reload_from_file_skips_unchanged_content() {
    let path = temp_files::create_temp_yaml(WIDGETS_YAML);
    let api = LiveApi::new(GeneratorConfig::default(), static_catalog());
    let mut digest = None;

    let report = reload_from_file(&path, &api, &mut digest).unwrap().unwrap();
    assert_eq!(report.version, 1);
    assert!(digest.is_some());

    assert!(reload_from_file(&path, &api, &mut digest).unwrap().is_none());
    assert_eq!(api.status().version, 1);

    std::fs::write(&path, GADGETS_YAML).unwrap();
    let report = reload_from_file(&path, &api, &mut digest).unwrap().unwrap();
    assert_eq!(report.version, 2);

    temp_files::cleanup_temp_files(&[path]);
}

#[test]
fn test_reload_from_file_keeps_module_on_bad_document() {
    let path = temp_files::create_temp_yaml(WIDGETS_YAML);
    let api = LiveApi::new(GeneratorConfig::default(), static_catalog());
    let mut digest = None;
    reload_from_file(&path, &api, &mut digest).unwrap();
    let good_digest = digest.clone();

    std::fs::write(&path, "openapi: [not, a, spec").unwrap();
    assert!(reload_from_file(&path, &api, &mut digest).is_err());
    assert_eq!(digest, good_digest);
    assert_eq!(api.status().version, 1);
    assert_eq!(api.dispatch("Widgets", "listWidgets").unwrap(), json!([]));

    temp_files::cleanup_temp_files(&[path]);
}

#[test]
fn test_watch_spec_reload() {
    let path = temp_files::create_temp_yaml(WIDGETS_YAML);
    let api = Arc::new(LiveApi::new(GeneratorConfig::default(), static_catalog()));
    let watcher = watch_spec(&path, Arc::clone(&api)).expect("watch_spec");

    // allow watcher thread to start
    std::thread::sleep(Duration::from_millis(100));

    std::fs::write(&path, GADGETS_YAML).unwrap();

    let mut reloaded = false;
    for _ in 0..40 {
        if api.dispatch("Gadgets", "listGadgets").is_ok() {
            reloaded = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    assert!(reloaded, "watcher did not activate the new document");
    assert!(api.status().version >= 1);

    drop(watcher);
    temp_files::cleanup_temp_files(&[path]);
}
