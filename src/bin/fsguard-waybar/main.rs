#![deny(clippy::pedantic)]

use fsguard::blocks::fsguard_block::FsGuardBlock;
use fsguard::blocks::{escape_markup, Block};
use fsguard::monitor::POLL_INTERVAL;
use std::sync::{mpsc, Arc};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // For cancellable sleep
    let (send, recv) = mpsc::channel::<()>();

    let instance = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "default".to_owned());
    let block = Arc::new(FsGuardBlock::new(&instance));

    // Clicks arrive as signals
    if let Err(e) = fsguard::signals::spawn_handler(Arc::clone(&block), send, true) {
        log::warn!("Unable to register signal handlers: {e}");
    }

    let mut last = String::new();
    loop {
        let out = if let Some(output) = block.render() {
            // Both fields are parsed as Pango markup and carry user text
            let text = escape_markup(&output.full_text);
            serde_json::json!({
                "text": if let Some(color) = output.color {
                    format!("<span color='{color}'>{text}</span>")
                } else { text },
                "tooltip": output.tooltip.as_deref().map(escape_markup),
                "class": output.class,
                "percentage": output.percentage,
            })
            .to_string()
        } else {
            String::from("{\"text\":\"\"}") // Nothing to print for now
        };
        if last != out {
            println!("{out}");
            last = out;
        }
        let _ = recv.recv_timeout(POLL_INTERVAL);
    }
}
