#![deny(clippy::pedantic)]

use fsguard::blocks::fsguard_block::FsGuardBlock;
use fsguard::blocks::Block;
use fsguard::monitor::POLL_INTERVAL;
use fsguard::I3Event;
use std::io::BufRead as _;
use std::sync::{mpsc, Arc};

/// Entrypoint
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // For cancellable sleep
    let (send, recv) = mpsc::channel::<()>();

    let instance = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "default".to_owned());
    let block = Arc::new(FsGuardBlock::new(&instance));

    if let Err(e) = fsguard::signals::spawn_handler(Arc::clone(&block), send.clone(), false) {
        log::warn!("Unable to register signal handlers: {e}");
    }

    // Header block
    println!(
        "{}",
        serde_json::json!({
            "version": 1,
            "stop_signal": 19,
            "cont_signal": 18,
            "click_events": true,
        })
    );

    // Begin infinite JSON stream
    println!("[");

    // Set up mouse event handler
    let block2 = Arc::clone(&block);
    let instance2 = instance.clone();
    std::thread::spawn(move || {
        event_handler(&block2, &instance2, &send);
    });

    // Sample forever
    loop {
        let out: Vec<_> = block
            .render()
            .map(|mut output| {
                output.name.clone_from(&instance);
                output
            })
            .into_iter()
            .collect();
        match serde_json::to_string(&out) {
            Ok(line) => println!("{line},"),
            Err(e) => log::error!("Unable to serialize block: {e}"),
        }
        let _ = recv.recv_timeout(POLL_INTERVAL);
    }
}

/// Handles I3 mouse events
fn event_handler(block: &FsGuardBlock, instance: &str, timer_cancel: &mpsc::Sender<()>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines().map_while(Result::ok) {
        // Pretty much I3's "hello"
        if line == "[" || line.is_empty() {
            continue;
        }
        // Handle the event
        match serde_json::from_str::<I3Event>(line.strip_prefix(',').unwrap_or(&line)) {
            Ok(event) if event.name.as_deref() == Some(instance) => {
                block.click(&event);
                let _idc = timer_cancel.send(());
            }
            Ok(event) => log::warn!("Got event for unknown block from i3: {:?}", event.name),
            Err(e) => log::warn!("Received invalid JSON from i3: {e}"),
        }
    }
}
