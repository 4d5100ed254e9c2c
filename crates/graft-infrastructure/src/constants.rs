//! Infrastructure constants

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "graft.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "graft";

/// Prefix for configuration overrides from the environment (`GRAFT__LOGGING__LEVEL`)
pub const CONFIG_ENV_PREFIX: &str = "GRAFT";

/// Separator between the prefix and nested keys of environment overrides
pub const CONFIG_ENV_SEPARATOR: &str = "__";

// ============================================================================
// CONTAINER CONSTANTS
// ============================================================================

/// Default shutdown and rollback budget in seconds
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable holding a `tracing` filter directive
pub const LOG_FILTER_ENV: &str = "GRAFT_LOG";

/// File stem used for rolling log files when none can be derived
pub const DEFAULT_LOG_FILE_STEM: &str = "graft";
