//! Signal handling shared by the bar front-ends

use crate::blocks::fsguard_block::FsGuardBlock;
use crate::blocks::Block;
use crate::I3Event;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// Signals waybar sends for left, middle and right clicks
pub const CLICK_SIGNALS: [i32; 3] = [35, 36, 37];

/// Starts a thread that reloads on `SIGHUP`, saves and exits on `SIGINT` and
/// `SIGTERM` and, if `clicks` is set, turns [`CLICK_SIGNALS`] into clicks
///
/// # Errors
/// Fails when the signal handlers cannot be registered
pub fn spawn_handler(
    block: Arc<FsGuardBlock>,
    timer_cancel: Sender<()>,
    clicks: bool,
) -> std::io::Result<()> {
    let mut wanted = vec![SIGHUP, SIGINT, SIGTERM];
    if clicks {
        wanted.extend(CLICK_SIGNALS);
    }
    let mut signals = Signals::new(wanted)?;

    std::thread::spawn(move || {
        for signal in signals.forever() {
            match signal {
                SIGHUP => {
                    block.reload();
                    let _idc = timer_cancel.send(());
                }
                SIGINT | SIGTERM => {
                    block.save();
                    std::process::exit(0);
                }
                // Left, middle, right
                35..=37 => {
                    block.click(&I3Event {
                        name: None,
                        button: u8::try_from(signal - 34).unwrap_or_default(),
                    });
                    let _idc = timer_cancel.send(());
                }
                _ => {}
            }
        }
    });
    Ok(())
}
