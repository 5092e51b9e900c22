//! User settings for pqview.
//!
//! Settings live in `<config_dir>/pqview/settings.json` and are created with
//! defaults the first time they are loaded. Unknown keys are ignored and missing
//! keys take their default, so older files keep loading.

mod error;
mod settings;

pub use error::{ConfigError, Result};
pub use settings::{Settings, settings_path};
