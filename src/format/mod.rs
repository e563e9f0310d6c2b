//! Output formatting for stage summaries and records (table, JSON, markdown).

use crate::amazon::{ProductRecord, Region};
use crate::config::OutputFormat;
use crate::pipeline::{DiscoverReport, ExtractReport, RunReport};
use serde_json::json;

/// Formats pipeline results for stdout.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the discover summary.
    pub fn format_discover(&self, report: &DiscoverReport) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Table => self.table_discover(report),
            OutputFormat::Markdown => self.markdown_discover(report),
        }
    }

    /// Formats the extract summary followed by its records.
    pub fn format_extract(&self, report: &ExtractReport) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Table => format!(
                "{}\n\nSaved to {} ({} complete, {} empty, {} timed out)",
                self.format_records(&report.records),
                report.output.display(),
                report.complete(),
                report.empty(),
                report.timed_out
            ),
            OutputFormat::Markdown => format!(
                "{}\n\n*Saved to `{}`*",
                self.format_records(&report.records),
                report.output.display()
            ),
        }
    }

    /// Formats every stage that ran.
    pub fn format_run(&self, report: &RunReport) -> String {
        if self.format == OutputFormat::Json {
            let value = json!({
                "discover": report.discover,
                "extract": report.extract,
                "interaction": report.interaction.as_ref().map(|r| r.to_string()),
                "stopped": report.stopped,
            });
            return serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string());
        }

        let mut sections = Vec::new();
        if let Some(discover) = &report.discover {
            sections.push(self.format_discover(discover));
        }
        if let Some(extract) = &report.extract {
            sections.push(self.format_extract(extract));
        }
        if let Some(interaction) = &report.interaction {
            sections.push(match self.format {
                OutputFormat::Markdown => format!("**Add to cart:** {}", interaction),
                _ => format!("Add to cart: {}", interaction),
            });
        }
        if let Some(reason) = report.stopped {
            sections.push(format!("Stopped before extraction: {}.", reason));
        }
        sections.join("\n\n")
    }

    /// Formats a list of records.
    pub fn format_records(&self, records: &[ProductRecord]) -> String {
        if records.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                _ => "No products extracted.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => self.table_records(records),
            OutputFormat::Markdown => self.markdown_records(records),
        }
    }

    /// Lists the supported storefronts.
    pub fn format_regions(&self) -> String {
        match self.format {
            OutputFormat::Json => {
                let regions: Vec<_> = Region::all()
                    .iter()
                    .map(|r| json!({ "code": r.code(), "domain": r.domain() }))
                    .collect();
                serde_json::to_string_pretty(&regions).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => {
                let mut lines = vec!["Supported regions:".to_string()];
                for region in Region::all() {
                    lines.push(format!("  {:<4} {}", region.code(), region.domain()));
                }
                lines.join("\n")
            }
            OutputFormat::Markdown => {
                let mut lines =
                    vec!["| Code | Domain |".to_string(), "|------|--------|".to_string()];
                for region in Region::all() {
                    lines.push(format!("| {} | {} |", region.code(), region.domain()));
                }
                lines.join("\n")
            }
        }
    }

    // Table formatting

    fn table_discover(&self, report: &DiscoverReport) -> String {
        let mut lines = Vec::new();
        lines.push(format!("Pages:     {}", report.pages_attempted));
        lines.push(format!("Failed:    {}", join_pages(&report.failed_pages)));
        if !report.blocked_pages.is_empty() {
            lines.push(format!("Blocked:   {}", join_pages(&report.blocked_pages)));
        }
        lines.push(format!("URLs:      {}", report.url_count()));
        lines.push(format!("Manifest:  {}", report.manifest.display()));
        lines.join("\n")
    }

    fn table_records(&self, records: &[ProductRecord]) -> String {
        let price_width = 10;
        let reviews_width = 8;
        let title_width = 50;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<price_width$}  {:<reviews_width$}  {:<title_width$}  {}",
            "Price", "Reviews", "Title", "URL"
        ));
        lines.push(format!(
            "{:-<price_width$}  {:-<reviews_width$}  {:-<title_width$}  {:-<3}",
            "", "", "", ""
        ));

        for record in records {
            let price = match record.price.value() {
                Some(p) => format!("{:.2}", p),
                None => record.price.cell(),
            };
            lines.push(format!(
                "{:>price_width$}  {:>reviews_width$}  {:<title_width$}  {}",
                price,
                record.reviews.cell(),
                truncate(&record.title.cell(), title_width),
                record.url
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} products", records.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_discover(&self, report: &DiscoverReport) -> String {
        let mut lines = Vec::new();
        lines.push("## Discovery".to_string());
        lines.push(String::new());
        lines.push(format!("- **Pages:** {}", report.pages_attempted));
        lines.push(format!("- **Failed pages:** {}", join_pages(&report.failed_pages)));
        lines.push(format!("- **URLs:** {}", report.url_count()));
        lines.push(format!("- **Manifest:** `{}`", report.manifest.display()));
        lines.join("\n")
    }

    fn markdown_records(&self, records: &[ProductRecord]) -> String {
        let mut lines = Vec::new();

        lines.push("| Title | Price | Reviews |".to_string());
        lines.push("|-------|-------|---------|".to_string());

        for record in records {
            let title = truncate(&record.title.cell(), 40).replace('|', "\\|");
            lines.push(format!(
                "| [{}]({}) | {} | {} |",
                title,
                record.url,
                record.price.cell(),
                record.reviews.cell()
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} products extracted*", records.len()));

        lines.join("\n")
    }
}

fn join_pages(pages: &[u32]) -> String {
    if pages.is_empty() {
        return "none".to_string();
    }
    pages.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width - 3).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
