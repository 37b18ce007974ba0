//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Initial URL in the path bar for a new request
pub const DEFAULT_URL: &str = "https://";

/// Application name
pub const APP_NAME: &str = "Courier";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bucket holding completed request/response pairs
pub const HISTORY_BUCKET: &str = "history";

/// Bucket holding user preferences
pub const SETTINGS_BUCKET: &str = "settings";

/// chrono format of a history key: `YYYYMMDDHHMMSS`, followed by `.fffff`
pub const HISTORY_KEY_FORMAT: &str = "%Y%m%d%H%M%S";

/// Setting name: syntax highlighting theme
pub const SETTING_THEME: &str = "theme";

/// Setting name: check for a newer release on startup
pub const SETTING_CHECK_UPDATES: &str = "checkUpdates";

/// Where the latest published versions are announced
pub const UPDATE_URL: &str = "https://probster.com/version.json";

/// Data directory name under the user's home
pub const DATA_DIR_NAME: &str = ".courier";

/// Database file inside the data directory
pub const DB_FILE_NAME: &str = "courier.db";

/// Log file inside the data directory
pub const LOG_FILE_NAME: &str = "courier.log";
