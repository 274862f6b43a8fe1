use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

use crate::config::Settings;
use crate::copy::{copy_dir, CopyStats};
use crate::mapping::AccountMapping;
use crate::resolver::resolve_folder_name;
use crate::retry::{execute_with_retry, RetryOutcome, RetryPolicy};

/// Suffix of the profile directory that belongs to a legacy account.
pub const PROFILE_SUFFIX: &str = ".V2";

/// What happened to one source home directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    Migrated,
    SkippedUnmapped,
    SkippedUnresolved,
    /// At least one retried step ran out of attempts
    Failed,
}

/// Totals for a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub units_seen: usize,
    pub migrated: usize,
    pub skipped_unmapped: usize,
    pub skipped_unresolved: usize,
    pub failed: usize,
    pub profiles_copied: usize,
    pub profiles_missing: usize,
    pub files_copied: usize,
    pub dirs_created: usize,
}

impl MigrationReport {
    fn record(&mut self, outcome: UnitOutcome) {
        self.units_seen += 1;
        match outcome {
            UnitOutcome::Migrated => self.migrated += 1,
            UnitOutcome::SkippedUnmapped => self.skipped_unmapped += 1,
            UnitOutcome::SkippedUnresolved => self.skipped_unresolved += 1,
            UnitOutcome::Failed => self.failed += 1,
        }
    }

    fn add_copy(&mut self, stats: CopyStats) {
        self.files_copied += stats.files_copied;
        self.dirs_created += stats.dirs_created;
    }
}

/// Paths derived for one legacy account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnit {
    pub legacy_id: String,
    pub email: String,
    pub folder_name: String,
    pub source_home: PathBuf,
    pub dest_user_root: PathBuf,
    pub dest_home: PathBuf,
    pub profile_source: PathBuf,
}

impl MigrationUnit {
    fn new(
        settings: &Settings,
        source_home: &Path,
        legacy_id: &str,
        email: &str,
        folder_name: &str,
    ) -> Self {
        let dest_user_root = settings.destination_path.join(folder_name);
        let dest_home = dest_user_root.join(&settings.user_home_folder_name);
        let profile_source = settings
            .profiles_path
            .join(format!("{}{}", legacy_id, PROFILE_SUFFIX));

        Self {
            legacy_id: legacy_id.to_string(),
            email: email.to_string(),
            folder_name: folder_name.to_string(),
            source_home: source_home.to_path_buf(),
            dest_user_root,
            dest_home,
            profile_source,
        }
    }
}

/// Checks the required inputs in order and stops at the first one missing.
pub fn validate_settings(settings: &Settings) -> Result<()> {
    if !settings.source_path.is_dir() {
        anyhow::bail!(
            "Home source path {} does not exist",
            settings.source_path.display()
        );
    }
    if !settings.profiles_path.is_dir() {
        anyhow::bail!(
            "RProfiles path {} does not exist",
            settings.profiles_path.display()
        );
    }
    if !settings.csv_file_path.is_file() {
        anyhow::bail!(
            "CSV file not found at {}",
            settings.csv_file_path.display()
        );
    }
    Ok(())
}

pub struct Migrator {
    settings: Settings,
    mapping: AccountMapping,
    policy: RetryPolicy,
}

impl Migrator {
    pub fn new(settings: Settings, mapping: AccountMapping) -> Self {
        let policy = RetryPolicy::new(settings.max_retries);
        Self {
            settings,
            mapping,
            policy,
        }
    }

    /// Validates `settings`, prepares the destination and loads the mapping.
    pub fn prepare(settings: Settings) -> Result<Self> {
        validate_settings(&settings)?;

        fs::create_dir_all(&settings.destination_path).with_context(|| {
            format!(
                "Failed to create destination {}",
                settings.destination_path.display()
            )
        })?;

        let mapping = AccountMapping::load(&settings.csv_file_path)?;
        info!("Loaded {} user mappings from CSV", mapping.len());

        Ok(Self::new(settings, mapping))
    }

    /// Migrates every home directory under the source root, one at a time.
    pub fn run(&self) -> Result<MigrationReport> {
        let home_dirs = self.home_directories()?;
        info!("Found {} folders in Home", home_dirs.len());

        let mut report = MigrationReport::default();
        for home_dir in home_dirs {
            let outcome = self.migrate_one(&home_dir, &mut report);
            report.record(outcome);
        }

        info!(
            "Migration completed: {} migrated, {} without mapping, {} unresolved, {} failed, {} profiles copied, {} files copied",
            report.migrated,
            report.skipped_unmapped,
            report.skipped_unresolved,
            report.failed,
            report.profiles_copied,
            report.files_copied
        );
        Ok(report)
    }

    fn home_directories(&self) -> Result<Vec<PathBuf>> {
        let source = &self.settings.source_path;
        let mut dirs = Vec::new();
        for entry in fs::read_dir(source)
            .with_context(|| format!("Failed to list {}", source.display()))?
        {
            let entry = entry.with_context(|| format!("Failed to list {}", source.display()))?;
            if entry.file_type()?.is_dir() {
                dirs.push(entry.path());
            }
        }
        Ok(dirs)
    }

    fn migrate_one(&self, home_dir: &Path, report: &mut MigrationReport) -> UnitOutcome {
        let Some(legacy_id) = home_dir.file_name().map(|n| n.to_string_lossy().to_string())
        else {
            return UnitOutcome::SkippedUnmapped;
        };
        info!("Processing Home folder: {}", legacy_id);

        let email = match self.mapping.get(&legacy_id) {
            Some(email) if !email.is_empty() => email,
            _ => {
                warn!(
                    "No CSV mapping found for ShadowAccount {}. Skipping.",
                    legacy_id
                );
                return UnitOutcome::SkippedUnmapped;
            }
        };

        let Some(folder_name) = resolve_folder_name(email, &legacy_id, &self.settings.trim_token)
        else {
            warn!("Invalid email {} for {}. Skipping.", email, legacy_id);
            return UnitOutcome::SkippedUnresolved;
        };

        if !is_single_folder_name(&folder_name) {
            warn!(
                "Folder name {:?} for {} would leave the destination root. Skipping.",
                folder_name, legacy_id
            );
            return UnitOutcome::SkippedUnresolved;
        }

        let unit = MigrationUnit::new(&self.settings, home_dir, &legacy_id, email, &folder_name);
        self.migrate_unit(&unit, report)
    }

    fn migrate_unit(&self, unit: &MigrationUnit, report: &mut MigrationReport) -> UnitOutcome {
        let created = execute_with_retry(
            &format!("CreateDirectory:{}", unit.dest_home.display()),
            self.policy,
            || {
                fs::create_dir_all(&unit.dest_home).with_context(|| {
                    format!("Failed to create {}", unit.dest_home.display())
                })
            },
        );
        if !created.is_success() {
            // Nothing below can land without the user folder
            return UnitOutcome::Failed;
        }

        let mut outcome = UnitOutcome::Migrated;

        let home_copy = execute_with_retry(
            &format!("CopyDirectory:Home:{}", unit.source_home.display()),
            self.policy,
            || copy_dir(&unit.source_home, &unit.dest_home),
        );
        if !tally_copy(home_copy, report) {
            outcome = UnitOutcome::Failed;
        }

        if unit.profile_source.is_dir() {
            let profile_copy = execute_with_retry(
                &format!("CopyDirectory:RProfiles:{}", unit.profile_source.display()),
                self.policy,
                || copy_dir(&unit.profile_source, &unit.dest_user_root),
            );
            if tally_copy(profile_copy, report) {
                report.profiles_copied += 1;
            } else {
                outcome = UnitOutcome::Failed;
            }
        } else {
            report.profiles_missing += 1;
            info!(
                "RProfiles not found for user {}. Skipping RProfiles migration.",
                unit.folder_name
            );
        }

        outcome
    }
}

/// True when `name` is exactly one plain path component (no separators, `..` or roots).
fn is_single_folder_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn tally_copy(outcome: RetryOutcome<CopyStats>, report: &mut MigrationReport) -> bool {
    match outcome {
        RetryOutcome::Succeeded { value, .. } => {
            report.add_copy(value);
            true
        }
        RetryOutcome::Exhausted { .. } => false,
    }
}
