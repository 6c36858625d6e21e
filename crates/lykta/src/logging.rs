//! Logger setup for binaries and examples.
//!
//! The library only uses the `log` macros. Installing a logger is up to the
//! host; [`init_logger`] is the one the viewer and the bundled examples use.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install an `env_logger` logger once per process.
///
/// Filter precedence: `filter` if given, else `RUST_LOG`, else `info`.
/// Later calls, and calls after another logger was installed, do nothing.
pub fn init_logger(filter: Option<&str>) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}
