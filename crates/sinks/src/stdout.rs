//! Stdout sink - human-readable debug output
//!
//! Prints one line per decoded event. Not intended for production use
//! at high throughput.
//!
//! # Example Output
//!
//! ```text
//! 05:34:00.000 192.0.2.7   local4.Notice  Aug 24 05:34:00 host1 app: msg
//! 22:14:15.003 192.0.2.9   auth.Critical  BOM'Hello
//! ```

use async_trait::async_trait;
use owo_colors::{OwoColorize, Style};

use silo_pipeline::{DecodedMessage, Sink, SinkError};

/// Configuration for the stdout sink
#[derive(Debug, Clone)]
pub struct StdoutConfig {
    /// Enable colored output
    pub color: bool,
}

impl Default for StdoutConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

impl StdoutConfig {
    /// Config with colors disabled (for piped output)
    pub fn no_color() -> Self {
        Self { color: false }
    }
}

// =============================================================================
// Color Styles
// =============================================================================

/// Color styles for terminal output
struct Styles {
    timestamp: Style,
    source: Style,
    level: Style,
    level_high: Style,
}

impl Styles {
    fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                timestamp: Style::new().dimmed(),
                source: Style::new().cyan(),
                level: Style::new().green(),
                level_high: Style::new().red().bold(),
            }
        } else {
            Self {
                timestamp: Style::new(),
                source: Style::new(),
                level: Style::new(),
                level_high: Style::new(),
            }
        }
    }
}

/// Sink that prints each event to stdout
pub struct StdoutSink {
    styles: Styles,
}

impl StdoutSink {
    /// Create a stdout sink
    pub fn new(config: StdoutConfig) -> Self {
        Self {
            styles: Styles::new(config.color),
        }
    }

    fn format_line(&self, message: &DecodedMessage) -> String {
        let event = &message.event;
        let level = format!("{}.{}", event.facility_name(), event.severity_name());
        // Severities 0..=3 (Emergency through Error) stand out
        let level_style = if event.severity <= 3 {
            self.styles.level_high
        } else {
            self.styles.level
        };

        format!(
            "{} {:<15} {:<14} {}",
            message
                .occurred_at
                .format("%H:%M:%S%.3f")
                .style(self.styles.timestamp),
            event.source_ip.style(self.styles.source),
            level.style(level_style),
            event.message,
        )
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new(StdoutConfig::default())
    }
}

#[async_trait]
impl Sink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn emit(&self, message: &DecodedMessage) -> Result<(), SinkError> {
        println!("{}", self.format_line(message));
        Ok(())
    }
}
