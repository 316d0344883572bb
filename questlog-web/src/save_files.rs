//! Save-state flows that need the page: downloads and full reloads.

use questlog_core::{KeyValueStore, Tracker, TrackerError};
use wasm_bindgen::JsValue;

use crate::dom;

pub const EXPORT_MIME: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum SaveFileError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error("browser refused: {0}")]
    Browser(String),
}

impl From<JsValue> for SaveFileError {
    fn from(value: JsValue) -> Self {
        Self::Browser(dom::js_error_message(&value))
    }
}

/// Download a game profile as `<name>_profile.json`.
///
/// # Errors
/// Returns `NotFound` for an unknown profile, or a browser error.
pub fn download_profile<S: KeyValueStore + Clone>(
    tracker: &Tracker<S>,
    id: &str,
) -> Result<(), SaveFileError> {
    let profiles = tracker.game_profiles();
    let document = profiles.export(id)?;
    let file_name = profiles.export_file_name(id)?;
    dom::download_text(&file_name, &document, EXPORT_MIME)?;
    log::info!("exported game profile as {file_name}");
    Ok(())
}

/// Import an uploaded document. Returns the new profile id.
///
/// # Errors
/// Returns `MalformedData`, `UnsupportedSchema`, a validation error, or a
/// storage error.
pub fn import_profile<S: KeyValueStore + Clone>(
    tracker: &mut Tracker<S>,
    document: &str,
) -> Result<String, SaveFileError> {
    Ok(tracker.game_profiles_mut().import(document)?)
}

/// Load a game profile, then reload the page so every view re-reads storage.
///
/// # Errors
/// Returns `NotFound`, a storage error, or a browser error.
pub fn load_profile_and_reload<S: KeyValueStore + Clone>(
    tracker: &mut Tracker<S>,
    id: &str,
) -> Result<(), SaveFileError> {
    tracker.load_game_profile(id)?;
    dom::reload_page()?;
    Ok(())
}
