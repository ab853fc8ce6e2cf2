// Output formatting for CLI

use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        match s {
            "json" => OutputFormat::Json,
            "yaml" => OutputFormat::Yaml,
            _ => OutputFormat::Text,
        }
    }

    /// Render a structured value as one document (empty for text)
    pub fn render_value<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => {
                serde_json::to_string_pretty(value).context("Failed to render JSON")
            }
            OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to render YAML"),
            OutputFormat::Text => Ok(String::new()),
        }
    }

    /// Print a structured value (no-op for text, which each command renders itself)
    pub fn print_value<T: Serialize>(&self, value: &T) -> Result<()> {
        if self.is_text() {
            return Ok(());
        }
        let rendered = self.render_value(value)?;
        println!("{}", rendered.trim_end());
        Ok(())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, OutputFormat::Text)
    }
}

/// Print a simple key-value pair for text output
pub fn print_field(label: &str, value: &str) {
    println!("{:<14} {}", format!("{}:", label), value);
}

/// Print a table header
pub fn print_table_header(columns: &[(&str, usize)]) {
    let header: String = columns
        .iter()
        .map(|(name, width)| format!("{:<width$}", name, width = width))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", header);
}

/// Print a table row, truncating cells that exceed their column width
pub fn print_table_row(values: &[(&str, usize)]) {
    let row: String = values
        .iter()
        .map(|(val, width)| format!("{:<width$}", truncate(val, *width), width = width))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", row);
}

fn truncate(val: &str, width: usize) -> String {
    if val.chars().count() <= width {
        return val.to_string();
    }
    let keep = width.saturating_sub(3);
    let mut s: String = val.chars().take(keep).collect();
    s.push_str("...");
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("yaml"), OutputFormat::Yaml);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert!(OutputFormat::parse("anything").is_text());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-activity-name", 10), "a-very-...");
        assert_eq!(truncate("äöüäöüäöüäöü", 6), "äöü...");
    }
}
