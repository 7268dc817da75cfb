#![deny(clippy::pedantic)]

pub mod blocks;
pub mod config;
pub mod launcher;
pub mod monitor;
pub mod notify;
pub mod signals;

/// A click event received from the bar
#[derive(Debug, Default, serde::Deserialize)]
pub struct I3Event {
    pub name: Option<String>,
    pub button: u8,
}
