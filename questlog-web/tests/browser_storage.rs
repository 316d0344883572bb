#![cfg(target_arch = "wasm32")]

use questlog_core::{KeyValueStore, NewObjective, Tracker, keys};
use questlog_web::save_files::{self, SaveFileError};
use questlog_web::{BrowserStorage, dom};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn fresh_storage() -> BrowserStorage {
    dom::local_storage().expect("localStorage").clear().expect("clear");
    BrowserStorage::open().expect("browser storage")
}

#[wasm_bindgen_test]
fn round_trips_raw_documents() {
    let storage = fresh_storage();
    assert!(storage.get("missing").is_none());
    storage.set("greeting", "hello").expect("write");
    assert_eq!(storage.get("greeting").as_deref(), Some("hello"));
    storage.remove("greeting");
    storage.remove("greeting");
    assert!(storage.get("greeting").is_none());
}

#[wasm_bindgen_test]
fn tracker_persists_between_opens() {
    let storage = fresh_storage();
    let mut tracker = Tracker::open(storage.clone());
    tracker
        .objectives_mut()
        .add(NewObjective::new("Find the lighthouse"))
        .expect("add objective");
    assert!(storage.get(keys::OBJECTIVES).is_some());

    let reopened = questlog_web::open_tracker().expect("tracker");
    assert_eq!(reopened.objectives().len(), 1);
    assert_eq!(reopened.objectives().list()[0].name, "Find the lighthouse");
}

#[wasm_bindgen_test]
fn import_rejects_garbage_without_writing() {
    let storage = fresh_storage();
    let mut tracker = Tracker::open(storage.clone());
    let err = save_files::import_profile(&mut tracker, "not a profile").unwrap_err();
    assert!(matches!(err, SaveFileError::Tracker(_)));
    assert!(storage.get(keys::GAME_PROFILES).is_none());
}

#[wasm_bindgen_test]
fn dom_helpers_resolve_in_browser() {
    assert!(dom::window().is_ok());
    assert!(dom::document().is_ok());
    let message = dom::js_error_message(&js_sys::Error::new("boom").into());
    assert_eq!(message, "boom");
}

#[wasm_bindgen_test]
fn console_logging_installs_once() {
    let _ = questlog_web::init_logging(tracing::Level::DEBUG);
    assert!(!questlog_web::init_logging(tracing::Level::DEBUG));
    // Core `log` records reach the subscriber without panicking.
    let storage = fresh_storage();
    storage.set(keys::MISSIONS, "{not json").expect("write");
    let tracker = Tracker::open(storage);
    assert!(tracker.missions().is_empty());
}
