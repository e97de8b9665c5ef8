//! gridsave CLI - evaluate and inspect grid documents

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gridsave::prelude::*;
use gridsave::{CellText, DocumentReadOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gridsave")]
#[command(author, version, about = "Evaluate and inspect grid documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the document with every formula evaluated
    Eval {
        /// Input document
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Field delimiter of the input (default: comma)
        #[arg(short, long, default_value = ",")]
        delimiter: char,
    },

    /// Show one cell's text and evaluated value
    Cell {
        /// Input document
        input: PathBuf,

        /// Cell address, e.g. B2 (row 1 is the first row below the headers)
        address: String,
    },

    /// List the cells a formula references, in order
    Refs {
        /// Formula, with or without the leading '='
        formula: String,
    },

    /// Show information about a document
    Info {
        /// Input document
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Eval {
            input,
            output,
            delimiter,
        } => eval(&input, output.as_deref(), delimiter),
        Commands::Cell { input, address } => show_cell(&input, &address),
        Commands::Refs { formula } => show_refs(&formula),
        Commands::Info { input } => show_info(&input),
    }
}

fn open(input: &Path, delimiter: char) -> Result<Grid> {
    if !delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character, got '{}'", delimiter);
    }
    let options = DocumentReadOptions::default().with_delimiter(delimiter as u8);
    DocumentReader::read_file(input, &options)
        .with_context(|| format!("Failed to open '{}'", input.display()))
}

fn eval(input: &Path, output: Option<&Path>, delimiter: char) -> Result<()> {
    let grid = open(input, delimiter)?;
    let document = grid.to_document();

    if let Some(output_path) = output {
        std::fs::write(output_path, &document)
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!(
            "Wrote {} rows to '{}'",
            grid.row_count(),
            output_path.display()
        );
    } else {
        let mut stdout = io::stdout();
        stdout
            .write_all(document.as_bytes())
            .and_then(|_| stdout.write_all(b"\n"))
            .context("Failed to write to stdout")?;
    }

    Ok(())
}

fn show_cell(input: &Path, address: &str) -> Result<()> {
    let grid = open(input, ',')?;
    let addr = CellAddress::parse(address)
        .with_context(|| format!("Invalid cell address '{}'", address))?;

    let Some(text) = grid.get(addr.row, addr.col) else {
        bail!(
            "{} is outside the grid ({} rows x {} columns)",
            addr,
            grid.row_count(),
            grid.col_count()
        );
    };

    println!("Cell: {}", addr);
    if let Some(header) = grid.headers().get(addr.col) {
        println!("Column: {}", header);
    }
    println!("Text: {}", text);
    println!("Value: {}", evaluate_cell(&grid, addr.row, addr.col));

    if let CellText::Formula(body) = CellText::classify(text) {
        let refs: Vec<String> = referenced_cells(body).iter().map(|a| a.to_string()).collect();
        println!("References: {}", refs.join(" "));
    }

    Ok(())
}

fn show_refs(formula: &str) -> Result<()> {
    let body = formula.strip_prefix('=').unwrap_or(formula);
    for addr in referenced_cells(body) {
        println!("{}", addr);
    }
    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let grid = open(input, ',')?;
    let stats = grid.calculate();

    println!("File: {}", input.display());
    println!("Columns: {}", grid.col_count());
    println!("Rows: {}", grid.row_count());
    println!("Formulas: {}", stats.formula_count);
    println!("Errors: {}", stats.errors);
    if stats.circular_references > 0 {
        println!("Circular references: {}", stats.circular_references);
    }

    let error_cells = grid.error_cells();
    if !error_cells.is_empty() {
        let cells: Vec<String> = error_cells.iter().map(|a| a.to_string()).collect();
        println!("Error cells: {}", cells.join(" "));
    }

    Ok(())
}
