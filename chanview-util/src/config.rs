/// Default data directory, relative to the home directory
pub const DEFAULT_DIR: &str = ".chanview";

/// Log level used when neither the command line nor the environment set one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Name of the snapshot file looked up in the data directory
pub const DEFAULT_SNAPSHOT_FILE: &str = "wallet.json";
