use std::path::Path;
use std::process::Command;

/// A program able to open a directory
#[derive(Debug, Clone, Copy)]
pub struct Launcher {
    pub program: &'static str,
    /// Arguments placed before the path
    pub args: &'static [&'static str],
}

/// Tried in order until one starts
pub const FILE_MANAGERS: &[Launcher] = &[
    Launcher {
        program: "exo-open",
        args: &["--launch", "FileManager"],
    },
    Launcher {
        program: "thunar",
        args: &[],
    },
    Launcher {
        program: "xdg-open",
        args: &[],
    },
];

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Unable to find an appropriate application to open the mount point")]
    NoLauncher,
}

/// Opens `path` with the first candidate that can be started and returns
/// its name
///
/// # Errors
/// Fails when none of the candidates could be started
pub fn open_path(path: &Path, candidates: &[Launcher]) -> Result<&'static str, LaunchError> {
    for launcher in candidates {
        match Command::new(launcher.program)
            .args(launcher.args)
            .arg(path)
            .spawn()
        {
            Ok(mut child) => {
                log::info!("Opening {} with {}", path.display(), launcher.program);
                // Reap the child once it exits
                std::thread::spawn(move || child.wait());
                return Ok(launcher.program);
            }
            Err(e) => log::debug!("Unable to start {}: {e}", launcher.program),
        }
    }
    Err(LaunchError::NoLauncher)
}
