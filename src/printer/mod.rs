mod errors;
mod table;

pub use errors::print_errors;
pub use table::TableData;

use clap::builder::PossibleValuesParser;
use serde::Serialize;
use std::fmt;
use std::io::Write;
use thiserror::Error;

const OUTPUT_ARG: &str = "output";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintFormat {
    Table,
    Json,
    Yaml,
}

impl PrintFormat {
    pub const fn name(self) -> &'static str {
        match self {
            PrintFormat::Table => "table",
            PrintFormat::Json => "json",
            PrintFormat::Yaml => "yaml",
        }
    }

    pub fn from_name(name: &str) -> Option<PrintFormat> {
        match name {
            "table" => Some(PrintFormat::Table),
            "json" => Some(PrintFormat::Json),
            "yaml" => Some(PrintFormat::Yaml),
            _ => None,
        }
    }
}

impl fmt::Display for PrintFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to encode YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("Output format \"{0}\" is not supported for this resource")]
    Unsupported(PrintFormat),
}

/// Maps the resources into rows for the table output.
pub type TableDataFn<T> = fn(&[T]) -> TableData;

enum Printer<T> {
    Table(TableDataFn<T>),
    Json,
    Yaml,
}

impl<T> Printer<T> {
    fn format(&self) -> PrintFormat {
        match self {
            Printer::Table(_) => PrintFormat::Table,
            Printer::Json => PrintFormat::Json,
            Printer::Yaml => PrintFormat::Yaml,
        }
    }
}

/// Prints a list of resources in one of the registered formats.
///
/// Formats are registered with the `with_*` builders, the active one is chosen once
/// through [`ResourcePrinter::set_format`] or [`ResourcePrinter::resolve_format`].
/// Table is the default when it is registered, otherwise the first registered format.
pub struct ResourcePrinter<T> {
    printers: Vec<Printer<T>>,
    format: Option<PrintFormat>,
}

impl<T: Serialize> ResourcePrinter<T> {
    pub fn new() -> Self {
        ResourcePrinter {
            printers: Vec::new(),
            format: None,
        }
    }

    pub fn with_table(self, table_data: TableDataFn<T>) -> Self {
        self.with(Printer::Table(table_data))
    }

    pub fn with_json(self) -> Self {
        self.with(Printer::Json)
    }

    pub fn with_yaml(self) -> Self {
        self.with(Printer::Yaml)
    }

    fn with(mut self, printer: Printer<T>) -> Self {
        let format = printer.format();
        self.printers.retain(|p| p.format() != format);
        self.printers.push(printer);
        self
    }

    fn default_format(&self) -> PrintFormat {
        if self.supports(PrintFormat::Table) {
            PrintFormat::Table
        } else {
            self.printers
                .first()
                .map(Printer::format)
                .unwrap_or(PrintFormat::Table)
        }
    }

    pub fn supports(&self, format: PrintFormat) -> bool {
        self.printers.iter().any(|p| p.format() == format)
    }

    pub fn print_format(&self) -> PrintFormat {
        self.format.unwrap_or_else(|| self.default_format())
    }

    pub fn set_format(&mut self, format: PrintFormat) -> Result<(), RenderError> {
        if !self.supports(format) {
            return Err(RenderError::Unsupported(format));
        }
        self.format = Some(format);
        Ok(())
    }

    /// Adds the `-o/--output` argument accepting the registered formats.
    pub fn register_arg(&self, cmd: clap::Command) -> clap::Command {
        let names: Vec<&'static str> = self.printers.iter().map(|p| p.format().name()).collect();
        cmd.arg(
            clap::Arg::new(OUTPUT_ARG)
                .short('o')
                .long("output")
                .value_parser(PossibleValuesParser::new(names))
                .default_value(self.default_format().name())
                .help("Output format"),
        )
    }

    pub fn resolve_format(&mut self, args: &clap::ArgMatches) -> anyhow::Result<()> {
        let Some(name) = args
            .try_get_one::<String>(OUTPUT_ARG)
            .map_err(|e| anyhow::anyhow!("Output argument is not registered: {e}"))?
        else {
            return Ok(());
        };

        let format = PrintFormat::from_name(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown output format \"{name}\""))?;
        self.set_format(format)?;
        Ok(())
    }

    pub fn print<W: Write>(&self, out: &mut W, resources: &[T]) -> Result<(), RenderError> {
        let format = self.print_format();
        let printer = self
            .printers
            .iter()
            .find(|p| p.format() == format)
            .ok_or(RenderError::Unsupported(format))?;

        match printer {
            Printer::Table(table_data) => {
                writeln!(out, "{}", table_data(resources).render())?;
            }
            Printer::Json => {
                serde_json::to_writer_pretty(&mut *out, resources)?;
                writeln!(out)?;
            }
            Printer::Yaml => {
                serde_yaml_ng::to_writer(&mut *out, resources)?;
            }
        }

        Ok(())
    }
}

impl<T: Serialize> Default for ResourcePrinter<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Item {
        name: &'static str,
        size: u32,
    }

    fn table_data(items: &[Item]) -> TableData {
        TableData {
            headers: vec!["NAME".into(), "SIZE".into()],
            rows: items
                .iter()
                .map(|i| vec![i.name.to_string(), i.size.to_string()])
                .collect(),
        }
    }

    fn items() -> Vec<Item> {
        vec![
            Item { name: "alpha", size: 1 },
            Item { name: "beta", size: 2 },
        ]
    }

    fn print_to_string(printer: &ResourcePrinter<Item>) -> String {
        let mut out = Vec::new();
        printer.print(&mut out, &items()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_default_format() {
        let printer = ResourcePrinter::new().with_json().with_table(table_data);
        assert_eq!(printer.print_format(), PrintFormat::Table);

        let printer = ResourcePrinter::<Item>::new().with_yaml().with_json();
        assert_eq!(printer.print_format(), PrintFormat::Yaml);
    }

    #[test]
    fn test_set_unregistered_format() {
        let mut printer = ResourcePrinter::<Item>::new().with_json();
        assert!(matches!(
            printer.set_format(PrintFormat::Yaml),
            Err(RenderError::Unsupported(PrintFormat::Yaml))
        ));
        assert_eq!(printer.print_format(), PrintFormat::Json);
    }

    #[test]
    fn test_print_json() {
        let mut printer = ResourcePrinter::new()
            .with_json()
            .with_yaml()
            .with_table(table_data);
        printer.set_format(PrintFormat::Json).unwrap();

        let value: serde_json::Value = serde_json::from_str(&print_to_string(&printer)).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{"name": "alpha", "size": 1}, {"name": "beta", "size": 2}])
        );
    }

    #[test]
    fn test_print_yaml() {
        let mut printer = ResourcePrinter::new().with_yaml().with_table(table_data);
        printer.set_format(PrintFormat::Yaml).unwrap();

        assert_eq!(
            print_to_string(&printer),
            "- name: alpha\n  size: 1\n- name: beta\n  size: 2\n"
        );
    }

    #[test]
    fn test_print_table() {
        let printer = ResourcePrinter::new().with_json().with_table(table_data);
        let out = print_to_string(&printer);

        let position = |pred: &dyn Fn(&str) -> bool| {
            out.lines()
                .position(pred)
                .unwrap_or_else(|| panic!("row missing in table:\n{out}"))
        };
        let header = position(&|l| l.contains("NAME") && l.contains("SIZE"));
        let alpha = position(&|l| l.contains("alpha") && l.contains('1'));
        let beta = position(&|l| l.contains("beta") && l.contains('2'));
        assert!(header < alpha && alpha < beta, "unexpected table:\n{out}");
    }

    #[test]
    fn test_output_arg() {
        let printer = ResourcePrinter::new()
            .with_json()
            .with_yaml()
            .with_table(table_data);
        let cmd = printer.register_arg(clap::Command::new("get"));

        let mut resolved = ResourcePrinter::new()
            .with_json()
            .with_yaml()
            .with_table(table_data);
        let args = cmd.clone().try_get_matches_from(["get", "-oyaml"]).unwrap();
        resolved.resolve_format(&args).unwrap();
        assert_eq!(resolved.print_format(), PrintFormat::Yaml);

        let args = cmd.clone().try_get_matches_from(["get"]).unwrap();
        resolved.resolve_format(&args).unwrap();
        assert_eq!(resolved.print_format(), PrintFormat::Table);

        assert!(cmd.try_get_matches_from(["get", "--output", "xml"]).is_err());
    }
}
