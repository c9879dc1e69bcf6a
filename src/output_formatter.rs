use crate::errors::Result;
use crate::result::ResourceResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

/// Defines the possible output formats for batch results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// A human-readable listing of changed lines.
    Text,
    /// JSON format, suitable for machine processing.
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Handles the formatting of batch results into the supported formats.
pub struct OutputFormatter {
    format: OutputFormat,
    include_summary: bool,
    dry_run: bool,
    tool_name: String,
    tool_version: String,
}

impl OutputFormatter {
    /// Creates a new `OutputFormatter`.
    ///
    /// # Arguments
    ///
    /// * `format` - The `OutputFormat` to use.
    /// * `include_summary` - Whether to append a summary (text format only).
    /// * `dry_run` - Whether the results come from a preview rather than a
    ///   commit, which only changes the wording.
    pub fn new(format: OutputFormat, include_summary: bool, dry_run: bool) -> Self {
        Self {
            format,
            include_summary,
            dry_run,
            tool_name: "reword".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Writes the formatted results to a given writer.
    pub fn write_output<W: Write>(&self, writer: &mut W, results: &[Arc<ResourceResult>]) -> Result<()> {
        let output = match self.format {
            OutputFormat::Text => self.format_text(results),
            OutputFormat::Json => self.format_json(results)?,
        };
        writer.write_all(output.as_bytes())?;

        if self.include_summary && self.format == OutputFormat::Text {
            writer.write_all(self.format_summary(results).as_bytes())?;
        }
        Ok(())
    }

    /// Lists every changed or failed resource with its changed lines.
    fn format_text(&self, results: &[Arc<ResourceResult>]) -> String {
        let verb = if self.dry_run { "Would modify" } else { "Modified" };
        let mut output = String::new();

        for result in results {
            let Some(changes) = result.changes() else {
                if let Some(cause) = result.cause() {
                    output.push_str(&format!("FAILED {}: {}\n", result.path().display(), cause));
                }
                continue;
            };
            if changes.modification_count == 0 {
                continue;
            }

            output.push_str(&format!(
                "{verb} {} ({} changes)\n",
                result.path().display(),
                changes.modification_count
            ));
            if let Some(name) = &changes.modified_name {
                output.push_str(&format!("  name: {} -> {}\n", result.original_name(), name));
            }
            for (index, line) in changes.lines.iter().enumerate() {
                if let Some(modified) = &line.modified {
                    output.push_str(&format!("  {:>5} - {}\n", index + 1, line.original));
                    output.push_str(&format!("  {:>5} + {}\n", index + 1, modified));
                }
            }
        }

        output
    }

    /// Formats results into a structured JSON document.
    fn format_json(&self, results: &[Arc<ResourceResult>]) -> Result<String> {
        #[derive(Serialize)]
        struct JsonOutput {
            tool: ToolInfo,
            generated_at: DateTime<Utc>,
            dry_run: bool,
            total_modifications: usize,
            resources: Vec<JsonResource>,
        }

        #[derive(Serialize)]
        struct ToolInfo {
            name: String,
            version: String,
        }

        #[derive(Serialize)]
        struct JsonResource {
            path: String,
            original_name: String,
            modified_name: Option<String>,
            modifications: usize,
            error: Option<String>,
            lines: Vec<JsonLine>,
        }

        #[derive(Serialize)]
        struct JsonLine {
            line: usize,
            original: String,
            modified: String,
        }

        let resources: Vec<JsonResource> = results
            .iter()
            .map(|result| JsonResource {
                path: result.path().display().to_string(),
                original_name: result.original_name().to_string(),
                modified_name: result.modified_name().map(str::to_string),
                modifications: result.modification_count(),
                error: result.cause().map(|cause| cause.to_string()),
                lines: result
                    .lines()
                    .unwrap_or_default()
                    .iter()
                    .enumerate()
                    .filter_map(|(index, line)| {
                        line.modified.as_ref().map(|modified| JsonLine {
                            line: index + 1,
                            original: line.original.clone(),
                            modified: modified.clone(),
                        })
                    })
                    .collect(),
            })
            .collect();

        let output = JsonOutput {
            tool: ToolInfo {
                name: self.tool_name.clone(),
                version: self.tool_version.clone(),
            },
            generated_at: Utc::now(),
            dry_run: self.dry_run,
            total_modifications: results.iter().map(|r| r.modification_count()).sum(),
            resources,
        };

        Ok(serde_json::to_string_pretty(&output)?)
    }

    /// Counts of scanned, changed and failed resources.
    fn format_summary(&self, results: &[Arc<ResourceResult>]) -> String {
        let changed = results.iter().filter(|r| r.has_modifications()).count();
        let failed = results.iter().filter(|r| r.is_exceptional()).count();
        let edits: usize = results.iter().map(|r| r.modification_count()).sum();

        let mut summary = String::new();
        summary.push_str(&format!("\n{}\n", "-".repeat(50)));
        summary.push_str(&format!("Resources scanned : {}\n", results.len()));
        summary.push_str(&format!("Resources changed : {changed}\n"));
        summary.push_str(&format!("Total edits       : {edits}\n"));
        summary.push_str(&format!("Failures          : {failed}\n"));
        summary
    }
}
