//! Desktop notifications via `org.freedesktop.Notifications`

use std::collections::HashMap;
use zbus::blocking::{Connection, Proxy};
use zbus::zvariant::Value;

/// How pressing a notification is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    Critical,
}

impl Urgency {
    fn hint(self) -> u8 {
        match self {
            Self::Normal => 1,
            Self::Critical => 2,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Normal => "dialog-information",
            Self::Critical => "dialog-warning",
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    proxy: Proxy<'static>,
}

impl Notifier {
    /// Connects to the notification daemon on the session bus. Returns `None`
    /// when there is no session bus.
    #[must_use]
    pub fn new() -> Option<Self> {
        let conn = Connection::session()
            .inspect_err(|e| log::warn!("No session bus for notifications: {e}"))
            .ok()?;
        let proxy = Proxy::new(
            &conn,
            "org.freedesktop.Notifications",
            "/org/freedesktop/Notifications",
            "org.freedesktop.Notifications",
        )
        .inspect_err(|e| log::warn!("Unable to reach the notification daemon: {e}"))
        .ok()?;
        Some(Self { proxy })
    }

    pub fn send(&self, summary: &str, body: &str, urgency: Urgency) {
        let urgency_hint = Value::from(urgency.hint());
        let mut hints = HashMap::<&str, &Value>::new();
        hints.insert("urgency", &urgency_hint);
        if let Err(e) = self.proxy.call_noreply(
            "Notify",
            &(
                "fsguard",
                0u32,
                urgency.icon(),
                summary,
                body,
                vec![""; 0],
                hints,
                -1i32,
            ),
        ) {
            log::warn!("Failed to send notification: {e}");
        }
    }
}

/// Shows a notification, or logs it if no notifier is available
pub fn show(notifier: Option<&Notifier>, summary: &str, body: &str, urgency: Urgency) {
    if let Some(notifier) = notifier {
        notifier.send(summary, body, urgency);
    } else {
        log::warn!("{summary}: {body}");
    }
}
