//! Free space sampling and classification for a single mount point

use crate::config::MonitorConfig;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;

/// How often the panel item samples its mount point
pub const POLL_INTERVAL: Duration = Duration::from_millis(8192);

const BYTES_PER_MB: f64 = 1_048_576.0;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Failed to query filesystem at {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },
}

/// Raw block counts of the filesystem containing a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsUsage {
    /// Size of one block in bytes
    pub block_size: u64,
    /// Blocks usable by unprivileged users
    pub blocks_available: u64,
    /// Total number of blocks
    pub blocks: u64,
}

impl FsUsage {
    #[allow(clippy::cast_precision_loss)] // Megabytes are shown with two decimals at most
    fn free_mb(&self) -> f64 {
        self.blocks_available as f64 * self.block_size as f64 / BYTES_PER_MB
    }

    #[allow(clippy::cast_precision_loss)]
    fn total_mb(&self) -> f64 {
        self.blocks as f64 * self.block_size as f64 / BYTES_PER_MB
    }
}

/// Something that can report filesystem usage
pub trait FsStat {
    /// Queries the filesystem containing `path`
    ///
    /// # Errors
    /// Returns an error when the path does not exist or cannot be queried
    fn stat(&self, path: &Path) -> Result<FsUsage, QueryError>;
}

/// Queries the kernel with `statvfs(3)`
#[derive(Debug, Default, Clone, Copy)]
pub struct Statvfs;

impl FsStat for Statvfs {
    #[allow(clippy::useless_conversion)] // Field widths differ between platforms
    fn stat(&self, path: &Path) -> Result<FsUsage, QueryError> {
        let stat = nix::sys::statvfs::statvfs(path).map_err(|source| QueryError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(FsUsage {
            block_size: u64::from(stat.block_size()),
            blocks_available: u64::from(stat.blocks_available()),
            blocks: u64::from(stat.blocks()),
        })
    }
}

/// Icon state of the panel item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceState {
    Normal,
    Warning,
    Urgent,
    /// The filesystem could not be queried
    Unknown,
}

impl SpaceState {
    /// Classifies a free percentage. A value sitting exactly on a threshold
    /// gets the stricter state.
    #[must_use]
    pub fn classify(percent_free: f64, warning_pct: u8, urgent_pct: u8) -> Self {
        if percent_free > f64::from(warning_pct) {
            Self::Normal
        } else if percent_free > f64::from(urgent_pct) {
            Self::Warning
        } else {
            Self::Urgent
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Urgent => "urgent",
            Self::Unknown => "unknown",
        }
    }
}

/// Outcome of one poll
#[derive(Debug, Clone, PartialEq)]
pub struct SampleResult {
    /// Whether the filesystem query succeeded
    pub ok: bool,
    pub free_mb: f64,
    pub total_mb: f64,
    /// `free_mb / total_mb`, 0 for an empty filesystem
    pub free_fraction: f64,
    pub state: SpaceState,
    /// Free space formatted for display
    pub free_text: String,
    /// Total space formatted for display
    pub total_text: String,
    pub tooltip: String,
}

impl SampleResult {
    fn failed(config: &MonitorConfig) -> Self {
        Self {
            ok: false,
            free_mb: 0.0,
            total_mb: 0.0,
            free_fraction: 0.0,
            state: SpaceState::Unknown,
            free_text: String::new(),
            total_text: String::new(),
            tooltip: format!(
                "could not check mountpoint {}, please check your config",
                config.path.display()
            ),
        }
    }

    /// Fraction of the filesystem in use, for meters. 0 when nothing is known.
    #[must_use]
    pub fn used_fraction(&self) -> f64 {
        if self.ok && self.total_mb > 0.0 {
            1.0 - self.free_fraction
        } else {
            0.0
        }
    }
}

/// Raised the first time a mount point enters the urgent state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceAlert {
    pub path: PathBuf,
    pub display_name: String,
    /// Free space formatted for display
    pub free_text: String,
    pub message: String,
}

/// Remembers which mount points already alerted the user
#[derive(Debug, Default)]
pub struct AlarmLatch {
    seen: HashSet<PathBuf>,
}

impl AlarmLatch {
    #[must_use]
    pub fn is_seen(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    /// Marks `path` as alerted. Returns `false` if it already was.
    pub fn fire(&mut self, path: &Path) -> bool {
        self.seen.insert(path.to_path_buf())
    }

    pub fn reset(&mut self, path: &Path) {
        self.seen.remove(path);
    }
}

/// Formats a size in megabytes, switching to gigabytes from 1024 MB on.
/// Megabytes are truncated to whole numbers.
#[must_use]
pub fn format_size(mb: f64) -> String {
    if mb >= 1024.0 {
        format!("{:.2} GB", mb / 1024.0)
    } else {
        format!("{:.0} MB", mb.trunc())
    }
}

/// " (name)" unless the name is empty or just repeats the path
fn name_suffix(config: &MonitorConfig) -> String {
    let name = config.display_name.as_str();
    if name.is_empty() || Path::new(name) == config.path {
        String::new()
    } else {
        format!(" ({name})")
    }
}

pub struct SpaceMonitor<S = Statvfs> {
    config: MonitorConfig,
    fs: S,
    latch: AlarmLatch,
    /// Receives urgent alerts
    alerts: Sender<SpaceAlert>,
}

impl SpaceMonitor<Statvfs> {
    #[must_use]
    pub fn new(config: MonitorConfig, alerts: Sender<SpaceAlert>) -> Self {
        Self::with_source(config, Statvfs, alerts)
    }
}

impl<S: FsStat> SpaceMonitor<S> {
    #[must_use]
    pub fn with_source(config: MonitorConfig, fs: S, alerts: Sender<SpaceAlert>) -> Self {
        Self {
            config,
            fs,
            latch: AlarmLatch::default(),
            alerts,
        }
    }

    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    #[must_use]
    pub fn latch(&self) -> &AlarmLatch {
        &self.latch
    }

    /// Samples the configured mount point. Never fails; a failed query is
    /// reported as [`SpaceState::Unknown`].
    pub fn sample(&mut self) -> SampleResult {
        let usage = match self.fs.stat(&self.config.path) {
            Ok(usage) => usage,
            Err(e) => {
                log::debug!("{e}");
                return SampleResult::failed(&self.config);
            }
        };

        let free_mb = usage.free_mb();
        let total_mb = usage.total_mb();
        let (free_fraction, percent_free) = if total_mb > 0.0 {
            // Multiply before dividing so thresholds are hit exactly
            (free_mb / total_mb, free_mb * 100.0 / total_mb)
        } else {
            (0.0, 0.0)
        };
        let state = SpaceState::classify(
            percent_free,
            self.config.warning_threshold_pct,
            self.config.urgent_threshold_pct,
        );

        let free_text = format_size(free_mb);
        let total_text = format_size(total_mb);
        let suffix = name_suffix(&self.config);
        let tooltip = format!(
            "{free_text}/{total_text} space left on {}{suffix}",
            self.config.path.display()
        );

        if state == SpaceState::Urgent && self.latch.fire(&self.config.path) {
            let alert = SpaceAlert {
                path: self.config.path.clone(),
                display_name: self.config.display_name.clone(),
                free_text: free_text.clone(),
                message: format!(
                    "Only {free_text} space left on {}{suffix}!",
                    self.config.path.display()
                ),
            };
            log::warn!("{}", alert.message);
            if self.alerts.send(alert).is_err() {
                log::debug!("Nobody is listening for space alerts");
            }
        }

        SampleResult {
            ok: true,
            free_mb,
            total_mb,
            free_fraction,
            state,
            free_text,
            total_text,
            tooltip,
        }
    }

    /// Replaces the configuration. Changing the path or a threshold re-arms
    /// the alert; cosmetic changes do not.
    pub fn update_config(&mut self, config: MonitorConfig) {
        if config.path != self.config.path
            || config.warning_threshold_pct != self.config.warning_threshold_pct
            || config.urgent_threshold_pct != self.config.urgent_threshold_pct
        {
            self.latch.reset(&self.config.path);
            self.latch.reset(&config.path);
        }
        self.config = config;
    }

    pub fn set_path(&mut self, path: PathBuf) {
        let config = MonitorConfig {
            path,
            ..self.config.clone()
        };
        self.update_config(config);
    }

    pub fn set_thresholds(&mut self, warning_pct: u8, urgent_pct: u8) {
        let config = MonitorConfig {
            warning_threshold_pct: warning_pct,
            urgent_threshold_pct: urgent_pct,
            ..self.config.clone()
        };
        self.update_config(config);
    }

    pub fn set_display_name(&mut self, name: String, visible: bool) {
        let config = MonitorConfig {
            display_name: name,
            show_display_name: visible,
            ..self.config.clone()
        };
        self.update_config(config);
    }

    pub fn set_flags(&mut self, show_size: bool, show_meter: bool, show_button: bool) {
        let config = MonitorConfig {
            show_size,
            show_meter,
            show_button,
            ..self.config.clone()
        };
        self.update_config(config);
    }
}
