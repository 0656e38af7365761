//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

/// Where the node's settings are persisted.
pub const CONFIG_FILE_PATH: &str = "/etc/dbnode/dbnode.conf";

/// Service job stopped while reconfiguring.
pub const SERVICE_JOB: &str = "dbnode";

/// Keys written uncommented even at their default value.
pub const ALWAYS_WRITE: &[&str] = &["BACKEND_ADDR", "UI_LOGDIR"];

/// Free space wanted under the data directory, in GiB.
pub const MIN_FREE_SPACE_GIB: u64 = 20;

/// Filesystems recommended for the data directory.
pub const VALID_FILESYSTEMS: &[&str] = &["ext4", "xfs"];

/// Redo space reserved by default, in MiB.
pub const MAX_REDO_MIB: &str = "1024";

pub const DATA_PATH: &str = "/data/dbnode";
pub const LOG_PATH: &str = "$DATA_PATH/log";
pub const UI_LOGDIR: &str = "$LOG_PATH/ui";
pub const UI_CACHEDIR: &str = "/var/cache/dbnode/ui";
pub const UNIX_SOCKET_PATH: &str = "/var/lib/mysql/mysql.sock";

pub const MYSQL_PORT: u16 = 3306;
pub const BACKEND_PORT: u16 = 24378;
pub const HTTP_PORT: u16 = 80;
pub const NANNY_PORT: u16 = 2424;
pub const CONTROL_PORT: u16 = 2048;
