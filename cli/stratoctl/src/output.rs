//! Output formatting for CLI commands.

use std::io::{self, Write};

use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::error::CliError;
use crate::table::{Table, Tabular};

/// Gap between columns in table output.
const COLUMN_GAP: &str = "   ";

/// Output format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable aligned columns.
    #[default]
    Table,
    /// Comma (or `--separator`) separated values.
    Csv,
    /// JSON, with the full nested structure of each resource.
    Json,
}

/// Renders resources to an output sink in the selected format.
pub struct Presenter<W: Write> {
    format: OutputFormat,
    separator: u8,
    out: W,
}

impl Presenter<io::Stdout> {
    pub fn stdout(format: OutputFormat, separator: u8) -> Self {
        Self::new(format, separator, io::stdout())
    }
}

impl<W: Write> Presenter<W> {
    pub fn new(format: OutputFormat, separator: u8, out: W) -> Self {
        Self {
            format,
            separator,
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print a list of resources.
    pub fn print_all<T: Tabular + Serialize>(&mut self, items: &[T]) -> Result<(), CliError> {
        if self.format == OutputFormat::Json {
            return self.write_json(items);
        }
        let mut table = Table::new();
        table.insert_all(items);
        self.render(&table)
    }

    /// Print a single resource.
    pub fn print_one<T: Tabular + Serialize>(&mut self, item: &T) -> Result<(), CliError> {
        if self.format == OutputFormat::Json {
            return self.write_json(item);
        }
        let mut table = Table::new();
        table.insert(item);
        self.render(&table)
    }

    /// Print a JSON mapping or sequence of mappings.
    pub fn print_value(&mut self, value: &serde_json::Value) -> Result<(), CliError> {
        if self.format == OutputFormat::Json {
            return self.write_json(value);
        }
        let mut table = Table::new();
        table.insert_value(value)?;
        self.render(&table)
    }

    /// Table or CSV text. JSON is serialized from the values themselves.
    fn render(&mut self, table: &Table) -> Result<(), CliError> {
        let rendered = if self.format == OutputFormat::Csv {
            render_csv(table, self.separator)?
        } else {
            render_text(table)
        };
        self.out.write_all(rendered.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, data: &T) -> Result<(), CliError> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to serialize output: {}", e)))?;
        writeln!(self.out, "{}", json)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Aligned columns with an uppercased header row.
pub fn render_text(table: &Table) -> String {
    if table.is_empty() {
        return format!("{}\n", "No items found.".dimmed());
    }

    let columns = table.columns();
    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .map(|column| pad(&column.name.to_uppercase(), column.width))
        .collect();
    out.push_str(&header.join(COLUMN_GAP));
    out.push('\n');

    for row in table.rows() {
        let cells: Vec<String> = columns
            .iter()
            .zip(row)
            .map(|(column, cell)| pad(cell, column.width))
            .collect();
        out.push_str(&cells.join(COLUMN_GAP));
        out.push('\n');
    }
    out
}

/// Separator-delimited rows, quoting only cells that need it.
pub fn render_csv(table: &Table, separator: u8) -> Result<String, CliError> {
    if table.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(separator)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());
    writer
        .write_record(table.columns().iter().map(|column| column.name.as_str()))
        .map_err(io::Error::from)?;
    for row in table.rows() {
        writer.write_record(row).map_err(io::Error::from)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to flush CSV output: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| CliError::Other(anyhow::anyhow!("CSV output is not UTF-8: {}", e)))
}

fn pad(value: &str, width: usize) -> String {
    format!("{:<width$}", value, width = width)
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "Success:".green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "Info:".blue().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Plan {
        slug: String,
        vcpus: u32,
        regions: Vec<String>,
    }

    impl Tabular for Plan {
        fn columns(&self) -> &'static [&'static str] {
            &["slug", "vcpus", "regions"]
        }

        fn value(&self, column: &str) -> Option<String> {
            Some(match column {
                "slug" => self.slug.clone(),
                "vcpus" => self.vcpus.to_string(),
                "regions" => self.regions.join(","),
                _ => return None,
            })
        }
    }

    fn plans() -> Vec<Plan> {
        vec![
            Plan {
                slug: "s-1".to_string(),
                vcpus: 1,
                regions: vec!["fra1".to_string()],
            },
            Plan {
                slug: "m-16-large".to_string(),
                vcpus: 16,
                regions: vec!["fra1".to_string(), "ams1".to_string()],
            },
        ]
    }

    fn output(
        format: OutputFormat,
        separator: u8,
        f: impl FnOnce(&mut Presenter<Vec<u8>>),
    ) -> String {
        let mut presenter = Presenter::new(format, separator, Vec::new());
        f(&mut presenter);
        String::from_utf8(presenter.into_inner()).unwrap()
    }

    #[test]
    fn table_pads_every_cell_to_column_width() {
        let text = output(OutputFormat::Table, b',', |p| p.print_all(&plans()).unwrap());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "SLUG         VCPUS   REGIONS  ");
        assert_eq!(lines[1], "s-1          1       fra1     ");
        assert_eq!(lines[2], "m-16-large   16      fra1,ams1");
    }

    #[test]
    fn header_cells_are_uppercased_names() {
        let mut table = Table::new();
        table.insert_all(&plans());
        let text = render_text(&table);
        let header: Vec<&str> = text.lines().next().unwrap().split_whitespace().collect();
        assert_eq!(header, vec!["SLUG", "VCPUS", "REGIONS"]);
    }

    #[test]
    fn csv_quotes_cells_containing_separator() {
        let text = output(OutputFormat::Csv, b',', |p| p.print_all(&plans()).unwrap());
        assert_eq!(
            text,
            "slug,vcpus,regions\ns-1,1,fra1\nm-16-large,16,\"fra1,ams1\"\n"
        );
    }

    #[test]
    fn csv_honors_custom_separator() {
        let text = output(OutputFormat::Csv, b';', |p| p.print_all(&plans()).unwrap());
        assert_eq!(text, "slug;vcpus;regions\ns-1;1;fra1\nm-16-large;16;fra1,ams1\n");
    }

    #[test]
    fn csv_cell_round_trips_through_reader() {
        let tricky = "say \"hi\", then leave";
        let text = output(OutputFormat::Csv, b',', |p| {
            p.print_value(&json!([{ "note": tricky }])).unwrap()
        });
        assert!(text.contains("\"say \"\"hi\"\", then leave\""));

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], tricky);
    }

    #[test]
    fn json_keeps_nested_structure() {
        let text = output(OutputFormat::Json, b',', |p| p.print_all(&plans()).unwrap());
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[1]["regions"], json!(["fra1", "ams1"]));
        assert_eq!(parsed[1]["vcpus"], json!(16));
    }

    #[test]
    fn unsupported_value_writes_nothing() {
        let mut presenter = Presenter::new(OutputFormat::Table, b',', Vec::new());
        let err = presenter.print_value(&json!("just a string")).unwrap_err();
        assert!(matches!(err, CliError::UnsupportedType(_)));
        assert!(presenter.into_inner().is_empty());
    }

    #[test]
    fn empty_list_per_format() {
        let empty: Vec<Plan> = Vec::new();
        let table = output(OutputFormat::Table, b',', |p| p.print_all(&empty).unwrap());
        assert!(table.contains("No items found."));
        let csv = output(OutputFormat::Csv, b',', |p| p.print_all(&empty).unwrap());
        assert!(csv.is_empty());
        let json = output(OutputFormat::Json, b',', |p| p.print_all(&empty).unwrap());
        assert_eq!(json.trim(), "[]");
    }
}
