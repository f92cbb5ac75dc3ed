#![allow(clippy::format_push_string)]
#![allow(clippy::uninlined_format_args)]

use crate::types::RatioAlert;

/// Maximum number of alerts rendered in one message.
pub const MAX_ALERTS_IN_MESSAGE: usize = 10;

const TITLE: &str = "High OI/MC ratio (Bybit USDT)";

pub struct AlertFormatter;

impl AlertFormatter {
    /// Renders a ranked alert list as a Telegram Markdown message.
    ///
    /// Returns `None` for an empty list: there is nothing to deliver.
    /// Only the first [`MAX_ALERTS_IN_MESSAGE`] alerts are rendered; the input
    /// is expected to be sorted already.
    #[must_use]
    pub fn format(alerts: &[RatioAlert], threshold: f64) -> Option<String> {
        if alerts.is_empty() {
            return None;
        }

        let mut output = String::new();

        output.push_str(&format!("*{}*\n", TITLE));
        output.push_str(&format!("_Threshold >{}%_\n", format_threshold(threshold)));
        output.push('\n');

        for alert in alerts.iter().take(MAX_ALERTS_IN_MESSAGE) {
            output.push_str(&format!(
                "{} • {:.1}%\n",
                escape_markdown(&alert.symbol),
                alert.ratio * 100.0
            ));
            output.push_str(&format!(
                "   MC ${:.1}M • OI ${:.1}M\n",
                alert.market_cap_usd / 1e6,
                alert.open_interest_usd / 1e6
            ));
        }

        if alerts.len() > MAX_ALERTS_IN_MESSAGE {
            output.push_str(&format!(
                "\n… and {} more\n",
                alerts.len() - MAX_ALERTS_IN_MESSAGE
            ));
        }

        Some(output)
    }
}

/// "25" for 0.25, "12.5" for 0.125.
fn format_threshold(threshold: f64) -> String {
    let pct = threshold * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{:.0}", pct)
    } else {
        format!("{:.1}", pct)
    }
}

/// Escapes the characters Telegram's legacy Markdown treats as entity markers.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
