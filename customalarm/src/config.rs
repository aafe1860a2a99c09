//! Application configuration constants
//!
//! Central location for defaults, storage limits and environment
//! variable names used throughout the application.

// ===== Alarm Defaults =====

/// Label given to an alarm when none is supplied
pub const DEFAULT_ALARM_NAME: &str = "Alarm";

/// Time given to an alarm when none is supplied
pub const DEFAULT_ALARM_TIME: &str = "07:00";

// ===== Alarm Set-Up Defaults =====

/// Hour shown by the edit flow before anything is loaded
pub const SETUP_DEFAULT_HOUR: u32 = 12;

/// Minute shown by the edit flow before anything is loaded
pub const SETUP_DEFAULT_MINUTE: u32 = 0;

/// Name shown by the edit flow before anything is loaded
pub const SETUP_DEFAULT_ALARM_NAME: &str = "";

// ===== Storage =====

/// File name of the SQLite database inside the data directory
pub const DATABASE_FILE_NAME: &str = "alarms.db";

/// Maximum connections in the application pool.
/// Writes are serialized by the repository, so a small pool is enough.
pub const MAX_POOL_CONNECTIONS: u32 = 4;

/// How long SQLite waits on a locked database before failing
pub const BUSY_TIMEOUT_SECS: u64 = 5;

// ===== Environment =====

/// Selects the repository backend: `memory` or `local`
pub const ENV_BACKEND: &str = "CUSTOMALARM_BACKEND";

/// Overrides the directory holding the database file
pub const ENV_DATA_DIR: &str = "CUSTOMALARM_DATA_DIR";

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "customalarm=debug,info";
