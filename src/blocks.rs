pub mod fsguard_block;

use super::I3Event;

#[derive(Debug, Default, serde::Serialize)]
pub struct I3Block {
    pub full_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub name: String,
    /// Hover text, for bars that support it
    #[serde(skip)]
    pub tooltip: Option<String>,
    /// Meter value in percent, for bars that support it
    #[serde(skip)]
    pub percentage: Option<u8>,
    /// Style class, for bars that support it
    #[serde(skip)]
    pub class: Option<&'static str>,
}

pub trait Block {
    fn render(&self) -> Option<I3Block>;
    fn click(&self, event: &I3Event);
}

/// Escapes text for bars that parse Pango markup
#[must_use]
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_escaped() {
        assert_eq!(escape_markup("💾 R&D 1.00 GB"), "💾 R&amp;D 1.00 GB");
        assert_eq!(
            escape_markup("space left on /mnt/<a>'b\""),
            "space left on /mnt/&lt;a&gt;&apos;b&quot;"
        );
        assert_eq!(escape_markup("plain"), "plain");
    }
}
