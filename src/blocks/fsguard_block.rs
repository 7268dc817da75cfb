use super::{Block, I3Block, I3Event};
use crate::config::{self, MonitorConfig, Origin};
use crate::launcher::{self, FILE_MANAGERS};
use crate::monitor::{SampleResult, SpaceAlert, SpaceMonitor, SpaceState};
use crate::notify::{self, Notifier, Urgency};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;

/// Used space, from empty to full
const METER: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub struct FsGuardBlock {
    /// Settings file, `None` without a home directory
    config_file: Option<PathBuf>,
    monitor: Mutex<SpaceMonitor>,
    notifier: Option<Notifier>,
    /// Settings need to be written back on teardown
    dirty: AtomicBool,
}

impl FsGuardBlock {
    /// Builds the block for a panel instance, reading its settings file
    #[must_use]
    pub fn new(instance: &str) -> Self {
        let config_file = config::config_file(instance);
        if config_file.is_none() {
            log::warn!("No config directory available, settings will not be saved");
        }
        Self::with_config_file(config_file, Notifier::new())
    }

    #[must_use]
    pub fn with_config_file(config_file: Option<PathBuf>, notifier: Option<Notifier>) -> Self {
        let loaded = config_file.as_deref().map(MonitorConfig::load_file);
        let (config, dirty) = match loaded {
            Some(Ok((config, origin))) => (config, origin != Origin::Stored),
            Some(Err(e)) => {
                // Leave the broken file alone so the user can fix it
                log::warn!("{e}, using defaults");
                (MonitorConfig::default(), false)
            }
            None => (MonitorConfig::default(), false),
        };
        log::info!("Watching {}", config.path.display());

        // Alerts are delivered off the render path
        let (send, recv) = mpsc::channel();
        let notifier2 = notifier.clone();
        std::thread::spawn(move || alert_thread(&recv, notifier2.as_ref()));

        Self {
            config_file,
            monitor: Mutex::new(SpaceMonitor::new(config, send)),
            notifier,
            dirty: AtomicBool::new(dirty),
        }
    }

    /// Re-reads the settings file and applies it. Path or threshold changes
    /// re-arm the low space alert.
    ///
    /// # Panics
    /// Panics if the monitor lock is poisoned
    pub fn reload(&self) {
        let Some(file) = &self.config_file else {
            return;
        };
        match MonitorConfig::load_file(file) {
            Ok((config, origin)) => {
                log::info!("Reloaded settings from {}", file.display());
                self.dirty.store(origin != Origin::Stored, Ordering::Relaxed);
                self.monitor.lock().unwrap().update_config(config);
            }
            Err(e) => log::warn!("Keeping current settings: {e}"),
        }
    }

    /// Writes the settings back if they changed since they were read
    ///
    /// # Panics
    /// Panics if the monitor lock is poisoned
    pub fn save(&self) {
        let Some(file) = &self.config_file else {
            return;
        };
        if !self.dirty.load(Ordering::Relaxed) {
            return;
        }
        let config = self.monitor.lock().unwrap().config().clone();
        match config.save_to(file) {
            Ok(()) => {
                log::info!("Saved settings to {}", file.display());
                self.dirty.store(false, Ordering::Relaxed);
            }
            Err(e) => log::warn!("{e}"),
        }
    }
}

impl Block for FsGuardBlock {
    fn render(&self) -> Option<I3Block> {
        let mut monitor = self.monitor.lock().unwrap();
        let sample = monitor.sample();
        block_for(&sample, monitor.config())
    }

    fn click(&self, evt: &I3Event) {
        if evt.button != 1 {
            return;
        }
        let config = self.monitor.lock().unwrap().config().clone();
        if !config.show_button {
            return;
        }
        if let Err(e) = launcher::open_path(&config.path, FILE_MANAGERS) {
            notify::show(
                self.notifier.as_ref(),
                "Free Space Checker",
                &e.to_string(),
                Urgency::Normal,
            );
        }
    }
}

fn alert_thread(recv: &Receiver<SpaceAlert>, notifier: Option<&Notifier>) {
    while let Ok(alert) = recv.recv() {
        notify::show(notifier, "Low disk space", &alert.message, Urgency::Critical);
    }
}

/// Builds the bar output for one sample
fn block_for(sample: &SampleResult, config: &MonitorConfig) -> Option<I3Block> {
    let mut parts = vec![];
    if config.show_button {
        parts.push("💾".to_owned());
    }
    if config.show_display_name && !config.display_name.is_empty() {
        parts.push(config.display_name.clone());
    }
    if config.show_meter && sample.ok {
        parts.push(meter(sample.used_fraction()).to_string());
    }
    if config.show_size {
        parts.push(if sample.ok {
            sample.free_text.clone()
        } else {
            "?".to_owned()
        });
    }
    if parts.is_empty() {
        return None;
    }

    let color = match sample.state {
        SpaceState::Normal => None,
        SpaceState::Warning => Some("#ffb000".to_owned()),
        SpaceState::Urgent => Some("#ff0202".to_owned()),
        SpaceState::Unknown => Some("#808080".to_owned()),
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Always within 0..=100
    let percentage = config
        .show_meter
        .then(|| (sample.used_fraction() * 100.0).round().clamp(0.0, 100.0) as u8);

    Some(I3Block {
        full_text: parts.join(" "),
        short_text: (config.show_size && sample.ok).then(|| sample.free_text.clone()),
        color,
        tooltip: Some(sample.tooltip.clone()),
        percentage,
        class: Some(sample.state.as_str()),
        ..Default::default()
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn meter(used_fraction: f64) -> char {
    let index = (used_fraction.clamp(0.0, 1.0) * 8.0).round() as usize;
    METER[index.min(8)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(state: SpaceState, free_fraction: f64) -> SampleResult {
        SampleResult {
            ok: state != SpaceState::Unknown,
            free_mb: free_fraction * 4096.0,
            total_mb: 4096.0,
            free_fraction,
            state,
            free_text: "1.00 GB".to_owned(),
            total_text: "4.00 GB".to_owned(),
            tooltip: "1.00 GB/4.00 GB space left on /".to_owned(),
        }
    }

    #[test]
    fn full_block() {
        let config = MonitorConfig {
            display_name: "root".to_owned(),
            ..MonitorConfig::default()
        };
        let block = block_for(&sample(SpaceState::Normal, 0.25), &config).unwrap();
        assert_eq!(block.full_text, "💾 root ▆ 1.00 GB");
        assert_eq!(block.short_text.as_deref(), Some("1.00 GB"));
        assert_eq!(block.color, None);
        assert_eq!(block.percentage, Some(75));
        assert_eq!(block.class, Some("normal"));
        assert_eq!(
            block.tooltip.as_deref(),
            Some("1.00 GB/4.00 GB space left on /")
        );
    }

    #[test]
    fn colors_follow_state() {
        let config = MonitorConfig::default();
        let warning = block_for(&sample(SpaceState::Warning, 0.05), &config).unwrap();
        assert_eq!(warning.color.as_deref(), Some("#ffb000"));
        assert_eq!(warning.class, Some("warning"));
        let urgent = block_for(&sample(SpaceState::Urgent, 0.01), &config).unwrap();
        assert_eq!(urgent.color.as_deref(), Some("#ff0202"));
        assert_eq!(urgent.class, Some("urgent"));
    }

    #[test]
    fn unknown_state_hides_numbers() {
        let config = MonitorConfig::default();
        let block = block_for(&sample(SpaceState::Unknown, 0.0), &config).unwrap();
        assert_eq!(block.full_text, "💾 ?");
        assert_eq!(block.short_text, None);
        assert_eq!(block.color.as_deref(), Some("#808080"));
        assert_eq!(block.percentage, Some(0));
    }

    #[test]
    fn flags_hide_parts() {
        let config = MonitorConfig {
            display_name: "root".to_owned(),
            show_display_name: false,
            show_meter: false,
            show_button: false,
            ..MonitorConfig::default()
        };
        let block = block_for(&sample(SpaceState::Normal, 0.25), &config).unwrap();
        assert_eq!(block.full_text, "1.00 GB");
        assert_eq!(block.percentage, None);
    }

    #[test]
    fn nothing_to_show() {
        let config = MonitorConfig {
            show_size: false,
            show_meter: false,
            show_button: false,
            ..MonitorConfig::default()
        };
        assert!(block_for(&sample(SpaceState::Normal, 0.25), &config).is_none());
    }

    #[test]
    fn meter_levels() {
        assert_eq!(meter(0.0), ' ');
        assert_eq!(meter(0.5), '▄');
        assert_eq!(meter(1.0), '█');
        assert_eq!(meter(1.5), '█');
    }

    #[test]
    fn i3_output_skips_bar_specific_fields() {
        let config = MonitorConfig::default();
        let block = block_for(&sample(SpaceState::Warning, 0.05), &config).unwrap();
        let json = serde_json::to_value(&block).unwrap();
        assert!(json.get("tooltip").is_none());
        assert!(json.get("percentage").is_none());
        assert_eq!(json["color"], "#ffb000");
    }

    fn write(file: &std::path::Path, contents: &str) {
        std::fs::write(file, contents).unwrap();
    }

    #[test]
    fn broken_file_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("default.rc");
        let contents = "schema=2\nyellow=lots\n";
        write(&file, contents);

        let block = FsGuardBlock::with_config_file(Some(file.clone()), None);
        assert_eq!(*block.monitor.lock().unwrap().config(), MonitorConfig::default());
        block.save();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), contents);
    }

    #[test]
    fn migrated_file_is_written_back() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("default.rc");
        write(&file, "mnt=\"/var\"\nyellow=2000\nred=500\n");

        let block = FsGuardBlock::with_config_file(Some(file.clone()), None);
        block.save();
        let (config, origin) = MonitorConfig::load_from(&file).unwrap();
        assert_eq!(origin, Origin::Stored);
        assert_eq!(config.path, PathBuf::from("/var"));
        assert_eq!(config.warning_threshold_pct, 8);
        assert_eq!(config.urgent_threshold_pct, 2);
    }

    #[test]
    fn missing_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("fsguard").join("default.rc");

        let block = FsGuardBlock::with_config_file(Some(file.clone()), None);
        block.save();
        let (config, origin) = MonitorConfig::load_from(&file).unwrap();
        assert_eq!(origin, Origin::Stored);
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn stored_file_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("default.rc");
        let contents = "# mine\nschema=2\nmnt=\"/\"\n";
        write(&file, contents);

        let block = FsGuardBlock::with_config_file(Some(file.clone()), None);
        block.save();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), contents);
    }

    #[test]
    fn reload_rearms_alert_only_on_relevant_changes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("default.rc");
        let mnt = dir.path().display().to_string();
        // 100% thresholds make every sample urgent
        write(&file, &format!("schema=2\nmnt=\"{mnt}\"\nyellow=100\nred=100\n"));

        let block = FsGuardBlock::with_config_file(Some(file.clone()), None);
        assert_eq!(block.render().unwrap().class, Some("urgent"));
        let seen = || block.monitor.lock().unwrap().latch().is_seen(dir.path());
        assert!(seen());

        write(
            &file,
            &format!("schema=2\nmnt=\"{mnt}\"\nlabel=\"tmp\"\nhide_button=true\nyellow=100\nred=100\n"),
        );
        block.reload();
        assert_eq!(block.monitor.lock().unwrap().config().display_name, "tmp");
        assert!(seen());

        write(&file, &format!("schema=2\nmnt=\"{mnt}\"\nyellow=100\nred=99\n"));
        block.reload();
        assert!(!seen());
    }

    #[test]
    fn reload_keeps_settings_on_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("default.rc");
        write(&file, "schema=2\nmnt=\"/var\"\n");

        let block = FsGuardBlock::with_config_file(Some(file.clone()), None);
        write(&file, "schema=2\nred=none\n");
        block.reload();
        assert_eq!(block.monitor.lock().unwrap().config().path, PathBuf::from("/var"));
    }
}
