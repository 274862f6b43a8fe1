pub mod config;
pub use config::Settings;

pub mod logging;
pub use logging::{init_logging, LogGuard};

pub mod mapping;
pub use mapping::AccountMapping;

pub mod resolver;
pub use resolver::resolve_folder_name;

pub mod copy;
pub use copy::{copy_dir, CopyStats};

pub mod retry;
pub use retry::{execute_with_retry, RetryOutcome, RetryPolicy};

pub mod migrate;
pub use migrate::{validate_settings, MigrationReport, Migrator, UnitOutcome};
