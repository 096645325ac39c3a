//! CLI tool for generating PowerPoint decks from tabular data.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pptgen_core::{ExpansionMode, LayoutChoice, SheetSelector, TemplateExpander};
use pptgen_data::DataLoader;
use pptgen_pptx::PptxDocument;
use std::path::PathBuf;

/// Fill a PowerPoint template with one slide per data row.
#[derive(Parser, Debug)]
#[command(name = "pptgen")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Data file (.csv, .xlsx, .xls, .ods)
    #[arg(short, long)]
    data: PathBuf,

    /// Template presentation (.pptx or .potx)
    #[arg(short, long, default_value = "template.pptx")]
    template: PathBuf,

    /// Output presentation
    #[arg(short, long, default_value = "output.pptx")]
    output: PathBuf,

    /// Worksheet name or 0-based index (spreadsheets only)
    #[arg(short, long)]
    sheet: Option<String>,

    /// How records become slides
    #[arg(short, long, value_enum, default_value_t = Mode::Duplicate)]
    mode: Mode,

    /// Layout name for new slides (layout mode)
    #[arg(long)]
    layout: Option<String>,

    /// 1-based slide copied once per record (duplicate mode)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pattern_slide: u32,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Copy the pattern slide once per record
    Duplicate,
    /// Add a slide from a layout per record
    Layout,
    /// Fill every existing slide with the first record
    Fill,
    /// Fill numbered tokens ({Client_1}, {Client_2}, ...) with all records at once
    Numbered,
}

impl From<Mode> for ExpansionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Duplicate => ExpansionMode::Duplicate,
            Mode::Layout => ExpansionMode::Layout,
            Mode::Fill => ExpansionMode::Fill,
            Mode::Numbered => ExpansionMode::Numbered,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    run(&args)?;
    println!("Wrote {}", args.output.display());
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    if args.layout.is_some() && args.mode != Mode::Layout {
        log::warn!("--layout only applies to layout mode; ignoring it");
    }

    let sheet = args.sheet.as_deref().map(SheetSelector::parse);
    let records = DataLoader::new()
        .load(&args.data, sheet.as_ref())
        .with_context(|| format!("Failed to load data from {}", args.data.display()))?;
    log::debug!("Loaded {} record(s)", records.len());

    let mut document = PptxDocument::open(&args.template)
        .with_context(|| format!("Failed to open template {}", args.template.display()))?;

    let layout = match &args.layout {
        Some(name) => LayoutChoice::Named(name.clone()),
        None => LayoutChoice::Default,
    };
    let expander = TemplateExpander::new()
        .with_mode(args.mode.into())
        .with_layout(layout)
        .with_pattern_slide(args.pattern_slide as usize);

    let summary = expander
        .expand(&mut document, &records)
        .context("Failed to expand template")?;
    log::debug!(
        "Filled {} slide(s): {} shape(s), {} cell(s), {} fallback write(s)",
        summary.slides.len(),
        summary.stats.shapes_written,
        summary.stats.cells_written,
        summary.stats.fallback_writes
    );

    document
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["pptgen", "--data", "clients.csv"]);
        assert_eq!(args.template, PathBuf::from("template.pptx"));
        assert_eq!(args.output, PathBuf::from("output.pptx"));
        assert_eq!(args.mode, Mode::Duplicate);
        assert_eq!(args.pattern_slide, 1);
        assert!(args.sheet.is_none());
    }

    #[test]
    fn test_mode_and_layout() {
        let args = Args::parse_from([
            "pptgen",
            "--data",
            "clients.xlsx",
            "--sheet",
            "Q3",
            "--mode",
            "layout",
            "--layout",
            "Title and Content",
        ]);
        assert_eq!(ExpansionMode::from(args.mode), ExpansionMode::Layout);
        assert_eq!(args.layout.as_deref(), Some("Title and Content"));
        assert_eq!(args.sheet.as_deref(), Some("Q3"));
    }

    #[test]
    fn test_numbered_mode_parses() {
        let args = Args::parse_from(["pptgen", "--data", "rows.csv", "--mode", "numbered"]);
        assert_eq!(ExpansionMode::from(args.mode), ExpansionMode::Numbered);
    }

    #[test]
    fn test_rejects_zero_pattern_slide() {
        assert!(Args::try_parse_from(["pptgen", "--data", "d.csv", "--pattern-slide", "0"]).is_err());
        assert!(Args::try_parse_from(["pptgen"]).is_err());
    }

    #[test]
    fn test_run_reports_missing_data() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::parse_from([
            "pptgen",
            "--data",
            dir.path().join("missing.csv").to_str().unwrap(),
            "--output",
            dir.path().join("out.pptx").to_str().unwrap(),
        ]);
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("Failed to load data"));
        assert!(!dir.path().join("out.pptx").exists());
    }

    #[test]
    fn test_run_writes_one_slide_per_row() {
        use pptgen_core::SlideDocument;

        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("clients.csv");
        let template = dir.path().join("template.potx");
        let output = dir.path().join("out").join("deck.pptx");
        std::fs::write(&data, "Client,Rev,Owner\nAcme,1000,Dana\nGlobex,,Lee\n").unwrap();
        std::fs::write(&template, pptgen_pptx::fixture::deck(true)).unwrap();

        let args = Args::parse_from([
            "pptgen",
            "--data",
            data.to_str().unwrap(),
            "--template",
            template.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ]);
        run(&args).unwrap();

        let deck = PptxDocument::open(&output).unwrap();
        assert!(!deck.was_template());
        assert_eq!(deck.slide_count(), 2);
        assert_eq!(deck.shape_text(0, 1).as_deref(), Some("Client: Acme, Revenue: 1000"));
        assert_eq!(deck.shape_text(1, 0).as_deref(), Some("Globex"));
        assert_eq!(deck.shape_text(1, 3).as_deref(), Some("Owner: Lee"));
    }
}
