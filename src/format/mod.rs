//! Output formatting for title records (table, JSON, markdown, CSV).
//!
//! Missing values: JSON keeps them as `null` (metascore as "N/A"); CSV
//! leaves the cell empty except for metascore, which reads "N/A"; table
//! and markdown show "N/A" everywhere.

use crate::config::OutputFormat;
use crate::imdb::models::{DetailRecord, NOT_AVAILABLE};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Fixed CSV column order.
pub const CSV_HEADER: &str = "Title,Year,Rating,Duration(min),Metascore,Actor1,Actor2,Actor3";

pub const JSON_FILE_NAME: &str = "movies_detailed.json";
pub const CSV_FILE_NAME: &str = "movies_detailed.csv";

/// Formats title records for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a single record.
    pub fn format_record(&self, record: &DetailRecord) -> String {
        match self.format {
            OutputFormat::Json => self.json_single(record),
            OutputFormat::Table => self.table_single(record),
            OutputFormat::Markdown => self.markdown_single(record),
            OutputFormat::Csv => self.csv_records(std::slice::from_ref(record)),
        }
    }

    /// Formats multiple records.
    pub fn format_records(&self, records: &[DetailRecord]) -> String {
        if records.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => CSV_HEADER.to_string(),
                _ => "No titles found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_records(records),
            OutputFormat::Table => self.table_records(records),
            OutputFormat::Markdown => self.markdown_records(records),
            OutputFormat::Csv => self.csv_records(records),
        }
    }

    // JSON formatting

    fn json_single(&self, record: &DetailRecord) -> String {
        serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string())
    }

    fn json_records(&self, records: &[DetailRecord]) -> String {
        serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
    }

    // Table formatting

    fn table_single(&self, record: &DetailRecord) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Title:     {}", or_na(record.title.as_deref())));
        lines.push(format!("Year:      {}", or_na(record.display_year())));

        match (&record.rating, &record.rating_count) {
            (Some(rating), Some(count)) => {
                lines.push(format!("Rating:    {}/10 ({} votes)", rating, count))
            }
            (Some(rating), None) => lines.push(format!("Rating:    {}/10", rating)),
            _ => lines.push(format!("Rating:    {}", NOT_AVAILABLE)),
        }

        lines.push(format!("Runtime:   {}", duration_text(record)));
        lines.push(format!("Metascore: {}", metascore_text(record)));

        if record.actors.is_empty() {
            lines.push(format!("Cast:      {}", NOT_AVAILABLE));
        } else {
            lines.push(format!("Cast:      {}", record.actors.join(", ")));
        }

        if let Some(genre) = &record.genre {
            lines.push(format!("Genre:     {}", genre));
        }

        lines.push(format!("URL:       {}", record.source_url));

        lines.join("\n")
    }

    fn table_records(&self, records: &[DetailRecord]) -> String {
        let rank_width = 4;
        let year_width = 6;
        let rating_width = 6;
        let runtime_width = 8;
        let meta_width = 5;
        let title_width = 45;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<rank_width$}  {:<title_width$}  {:<year_width$}  {:<rating_width$}  {:<runtime_width$}  {:<meta_width$}  {}",
            "#", "Title", "Year", "Rating", "Runtime", "Meta", "Cast"
        ));
        lines.push(format!(
            "{:-<rank_width$}  {:-<title_width$}  {:-<year_width$}  {:-<rating_width$}  {:-<runtime_width$}  {:-<meta_width$}  {:-<30}",
            "", "", "", "", "", "", ""
        ));

        for (idx, record) in records.iter().enumerate() {
            let cast =
                if record.actors.is_empty() { NOT_AVAILABLE.to_string() } else { record.actors.join(", ") };

            lines.push(format!(
                "{:<rank_width$}  {:<title_width$}  {:<year_width$}  {:>rating_width$}  {:>runtime_width$}  {:>meta_width$}  {}",
                idx + 1,
                truncate(or_na(record.title.as_deref()), title_width),
                or_na(record.display_year()),
                or_na(record.rating.as_deref()),
                duration_text(record),
                metascore_text(record),
                cast
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} titles", records.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_single(&self, record: &DetailRecord) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## {}", or_na(record.title.as_deref())));
        lines.push(String::new());

        lines.push(format!("- **Year:** {}", or_na(record.display_year())));
        lines.push(format!("- **Rating:** {}", or_na(record.rating.as_deref())));
        lines.push(format!("- **Runtime:** {}", duration_text(record)));
        lines.push(format!("- **Metascore:** {}", metascore_text(record)));

        if !record.actors.is_empty() {
            lines.push(format!("- **Cast:** {}", record.actors.join(", ")));
        }

        if let Some(description) = &record.description {
            lines.push(format!("- **Plot:** {}", description));
        }

        lines.push(format!("- **URL:** [View on IMDb]({})", record.source_url));

        lines.join("\n")
    }

    fn markdown_records(&self, records: &[DetailRecord]) -> String {
        let mut lines = Vec::new();

        lines.push("| # | Title | Year | Rating | Runtime | Metascore | Cast |".to_string());
        lines.push("|---|-------|------|--------|---------|-----------|------|".to_string());

        for (idx, record) in records.iter().enumerate() {
            lines.push(format!(
                "| {} | [{}]({}) | {} | {} | {} | {} | {} |",
                idx + 1,
                or_na(record.title.as_deref()).replace('|', "\\|"),
                record.source_url,
                or_na(record.display_year()),
                or_na(record.rating.as_deref()),
                duration_text(record),
                metascore_text(record),
                record.actors.join(", ")
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} titles*", records.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_records(&self, records: &[DetailRecord]) -> String {
        let mut lines = Vec::new();
        lines.push(CSV_HEADER.to_string());

        for record in records {
            let duration = record.duration_minutes.map(|m| m.to_string()).unwrap_or_default();
            let actor = |i: usize| Self::csv_escape(record.actor(i).unwrap_or_default());

            lines.push(format!(
                "{},{},{},{},{},{},{},{}",
                Self::csv_escape(record.title.as_deref().unwrap_or_default()),
                Self::csv_escape(record.display_year().unwrap_or_default()),
                Self::csv_escape(record.rating.as_deref().unwrap_or_default()),
                duration,
                Self::csv_escape(&metascore_text(record)),
                actor(0),
                actor(1),
                actor(2)
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

/// Writes `movies_detailed.json` and `movies_detailed.csv` into `dir`.
///
/// The directory is created when missing. Returns the written paths.
pub fn write_outputs(dir: &Path, records: &[DetailRecord]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let json_path = dir.join(JSON_FILE_NAME);
    let json = serde_json::to_string_pretty(records).context("Failed to serialize records")?;
    std::fs::write(&json_path, json)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    let csv_path = dir.join(CSV_FILE_NAME);
    let csv = Formatter::new(OutputFormat::Csv).format_records(records);
    std::fs::write(&csv_path, csv + "\n")
        .with_context(|| format!("Failed to write {}", csv_path.display()))?;

    info!("Saved {} records to {} and {}", records.len(), json_path.display(), csv_path.display());
    Ok(vec![json_path, csv_path])
}

fn or_na(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(NOT_AVAILABLE)
}

fn duration_text(record: &DetailRecord) -> String {
    match record.duration_minutes {
        Some(m) if m > 0 => format!("{} min", m),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn metascore_text(record: &DetailRecord) -> String {
    record
        .metascore
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imdb::models::Metascore;

    fn make_record() -> DetailRecord {
        let mut record = DetailRecord::new("https://www.imdb.com/title/tt0060196/");
        record.title = Some("The Good, the Bad and the Ugly".to_string());
        record.year = Some("1966-12-23".to_string());
        record.rating = Some("8.8".to_string());
        record.rating_count = Some("850000".to_string());
        record.duration_minutes = Some(178);
        record.metascore = Some(Metascore::Score("90".to_string()));
        record.actors = vec!["Clint Eastwood".to_string(), "Eli Wallach".to_string()];
        record.genre = Some("Western".to_string());
        record.description = Some("A bounty hunting scam joins two men.".to_string());
        record
    }

    #[test]
    fn test_csv_header_and_row() {
        let formatter = Formatter::new(OutputFormat::Csv);
        let output = formatter.format_records(&[make_record()]);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "Title,Year,Rating,Duration(min),Metascore,Actor1,Actor2,Actor3");
        assert_eq!(
            lines[1],
            "\"The Good, the Bad and the Ugly\",1966,8.8,178,90,Clint Eastwood,Eli Wallach,"
        );
    }

    #[test]
    fn test_csv_missing_values() {
        let formatter = Formatter::new(OutputFormat::Csv);
        let mut record = DetailRecord::new("https://www.imdb.com/title/tt0000001/");
        record.metascore = Some(Metascore::NotAvailable);
        let output = formatter.format_records(&[record]);
        assert_eq!(output.lines().nth(1), Some(",,,,N/A,,,"));

        // Metascore never probed also renders as N/A
        let output = formatter.format_records(&[DetailRecord::new("u")]);
        assert_eq!(output.lines().nth(1), Some(",,,,N/A,,,"));
    }

    #[test]
    fn test_csv_sentinel_row() {
        let formatter = Formatter::new(OutputFormat::Csv);
        let output = formatter.format_records(&[DetailRecord::connection_error("u")]);
        assert_eq!(output.lines().nth(1), Some("connection error,N/A,N/A,0,N/A,,,"));
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(Formatter::csv_escape("simple"), "simple");
        assert_eq!(Formatter::csv_escape("a,b"), "\"a,b\"");
        assert_eq!(Formatter::csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_json_records() {
        let formatter = Formatter::new(OutputFormat::Json);
        let output = formatter.format_records(&[make_record()]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed[0]["title"], "The Good, the Bad and the Ugly");
        assert_eq!(parsed[0]["year"], "1966-12-23");
        assert_eq!(parsed[0]["durationMinutes"], 178);
        assert_eq!(parsed[0]["metascore"], "90");
        assert_eq!(parsed[0]["actors"][1], "Eli Wallach");
        assert!(parsed[0]["image"].is_null());
    }

    #[test]
    fn test_empty_records() {
        assert_eq!(Formatter::new(OutputFormat::Json).format_records(&[]), "[]");
        assert_eq!(Formatter::new(OutputFormat::Csv).format_records(&[]), CSV_HEADER);
        assert_eq!(Formatter::new(OutputFormat::Table).format_records(&[]), "No titles found.");
    }

    #[test]
    fn test_table_records() {
        let formatter = Formatter::new(OutputFormat::Table);
        let output = formatter.format_records(&[make_record(), DetailRecord::new("u")]);

        assert!(output.contains("The Good, the Bad and the Ugly"));
        assert!(output.contains("1966"));
        assert!(!output.contains("1966-12-23"));
        assert!(output.contains("178 min"));
        assert!(output.contains("Total: 2 titles"));
    }

    #[test]
    fn test_table_single() {
        let formatter = Formatter::new(OutputFormat::Table);
        let output = formatter.format_record(&make_record());

        assert!(output.contains("Title:     The Good, the Bad and the Ugly"));
        assert!(output.contains("Rating:    8.8/10 (850000 votes)"));
        assert!(output.contains("Metascore: 90"));
        assert!(output.contains("Cast:      Clint Eastwood, Eli Wallach"));
    }

    #[test]
    fn test_markdown_single_and_records() {
        let formatter = Formatter::new(OutputFormat::Markdown);
        let single = formatter.format_record(&make_record());
        assert!(single.starts_with("## The Good, the Bad and the Ugly"));
        assert!(single.contains("[View on IMDb](https://www.imdb.com/title/tt0060196/)"));

        let table = formatter.format_records(&[make_record()]);
        assert!(table.contains("| 1 | [The Good, the Bad and the Ugly]"));
        assert!(table.contains("*1 titles*"));
    }

    #[test]
    fn test_write_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("results");
        let records = vec![make_record(), DetailRecord::connection_error("u")];

        let paths = write_outputs(&out, &records).unwrap();
        assert_eq!(paths, vec![out.join("movies_detailed.json"), out.join("movies_detailed.csv")]);

        let json = std::fs::read_to_string(out.join("movies_detailed.json")).unwrap();
        let parsed: Vec<DetailRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], records[0]);
        assert_eq!(parsed[1].title.as_deref(), Some("connection error"));

        let csv = std::fs::read_to_string(out.join("movies_detailed.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.starts_with(CSV_HEADER));
        assert!(csv.ends_with('\n'));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long movie title", 10), "a very ...");
    }
}
