#![forbid(unsafe_code)]
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod dom;
pub mod save_files;
pub mod storage;

pub use storage::{BrowserStorage, BrowserStorageError, open_tracker};

/// Send `tracing` events, and the `log` records emitted by the core crate,
/// to the browser console. Returns `false` if a global subscriber was
/// already installed.
#[cfg(target_arch = "wasm32")]
pub fn init_logging(max_level: tracing::Level) -> bool {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let config = tracing_wasm::WASMLayerConfigBuilder::new()
        .set_max_level(max_level)
        .set_report_logs_in_timings(false)
        .build();
    tracing_subscriber::registry()
        .with(tracing_wasm::WASMLayer::new(config))
        .try_init()
        .is_ok()
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    init_logging(tracing::Level::INFO);
    match open_tracker() {
        Ok(tracker) => log::info!(
            "questlog ready: {} objectives, {} missions, {} guides",
            tracker.objectives().len(),
            tracker.missions().len(),
            tracker.guides().len()
        ),
        Err(err) => dom::console_error(&err.to_string()),
    }
}
