//! Human and JSON output for every command

use comfy_table::{presets, ContentArrangement, Table};
use console::style;
use serde::Serialize;

use super::OutputConfig;

/// Formatter for CLI output
///
/// When JSON mode is enabled, all output is strict JSON without colors.
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Check if JSON output mode is enabled
    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    /// Check if colors are enabled
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Prefix `message` with a status symbol, styled when colors are on
    fn marked(&self, symbol: &str, color: console::Color, message: &str) -> String {
        if self.colors_enabled() {
            format!("{} {message}", style(symbol).fg(color))
        } else {
            format!("{symbol} {message}")
        }
    }

    /// Report a completed action on stdout; silent in quiet and JSON modes
    pub fn success(&self, message: &str) {
        if !self.config.quiet && !self.config.json {
            println!("{}", self.marked("✓", console::Color::Green, message));
        }
    }

    /// Report a failure on stderr, even in quiet mode
    ///
    /// In JSON mode the message is wrapped as `{"error": ...}`.
    pub fn error(&self, message: &str) {
        if self.config.json {
            eprintln!("{}", serde_json::json!({ "error": message }));
        } else {
            eprintln!("{}", self.marked("✗", console::Color::Red, message));
        }
    }

    /// Report a non-fatal problem on stderr
    pub fn warning(&self, message: &str) {
        if !self.config.quiet && !self.config.json {
            eprintln!("{}", self.marked("⚠", console::Color::Yellow, message));
        }
    }

    /// Output JSON directly
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// Print a line of text (respects quiet mode)
    pub fn println(&self, message: &str) {
        if self.config.quiet {
            return;
        }
        println!("{message}");
    }

    /// Dim a piece of text when colors are enabled
    pub fn dim(&self, text: &str) -> String {
        if self.colors_enabled() {
            style(text).dim().to_string()
        } else {
            text.to_string()
        }
    }

    /// Start a table with the house style
    pub fn table(&self, header: &[&str]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_BORDERS_ONLY)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(header.to_vec());
        if !self.colors_enabled() {
            table.force_no_tty();
        }
        table
    }

    /// Print a table (respects quiet mode)
    pub fn print_table(&self, table: &Table) {
        if self.config.quiet {
            return;
        }
        println!("{table}");
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatter_default() {
        let formatter = Formatter::default();
        assert!(!formatter.is_json());
        assert!(!formatter.is_quiet());
        assert!(formatter.colors_enabled());
    }

    #[test]
    fn test_formatter_json_mode() {
        let config = OutputConfig {
            json: true,
            ..Default::default()
        };
        let formatter = Formatter::new(config);
        assert!(formatter.is_json());
        assert!(!formatter.colors_enabled());
    }

    #[test]
    fn test_formatter_no_color() {
        let config = OutputConfig {
            no_color: true,
            ..Default::default()
        };
        let formatter = Formatter::new(config);
        assert!(!formatter.colors_enabled());
        assert_eq!(formatter.dim("text"), "text");
    }

    #[test]
    fn test_marked_without_color() {
        let formatter = Formatter::new(OutputConfig {
            no_color: true,
            ..Default::default()
        });
        assert_eq!(
            formatter.marked("✓", console::Color::Green, "Removed 3 objects"),
            "✓ Removed 3 objects"
        );
    }

    #[test]
    fn test_table_contains_cells() {
        let config = OutputConfig {
            no_color: true,
            ..Default::default()
        };
        let formatter = Formatter::new(config);
        let mut table = formatter.table(&["name", "container"]);
        table.add_row(vec!["demo", "zarr"]);
        let rendered = table.to_string();
        assert!(rendered.contains("name"));
        assert!(rendered.contains("demo"));
        assert!(rendered.contains("zarr"));
    }
}
