//! Print the text of every slide in a presentation.

use anyhow::{Context, Result};
use clap::Parser;
use pptgen_core::SlideText;
use pptgen_pptx::PptxDocument;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

/// Dump slide text, or the `{field}` tokens a template expects.
#[derive(Parser, Debug)]
#[command(name = "pptgen-inspect")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Presentation or template to inspect (.pptx or .potx)
    file: PathBuf,

    /// List distinct placeholders per slide instead of text
    #[arg(short, long)]
    placeholders: bool,

    /// Emit JSON
    #[arg(short, long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Placeholder listing for one slide.
#[derive(Serialize)]
struct SlidePlaceholders<'a> {
    number: usize,
    placeholders: &'a [String],
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    if !args.file.exists() {
        eprintln!("File not found: {}", args.file.display());
        return Ok(ExitCode::from(2));
    }

    let document = PptxDocument::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let slides = document.extract_text();
    log::debug!("Read {} slide(s)", slides.len());

    print!("{}", render(&slides, &args)?);
    Ok(ExitCode::SUCCESS)
}

fn render(slides: &[SlideText], args: &Args) -> Result<String> {
    if args.json {
        let mut json = if args.placeholders {
            let listing: Vec<SlidePlaceholders> = slides
                .iter()
                .map(|s| SlidePlaceholders {
                    number: s.number,
                    placeholders: &s.placeholders,
                })
                .collect();
            serde_json::to_string_pretty(&listing)?
        } else {
            serde_json::to_string_pretty(slides)?
        };
        json.push('\n');
        return Ok(json);
    }

    let mut output = String::new();
    for slide in slides {
        output.push_str(&format!("--- Slide {} ---\n", slide.number));
        let lines = if args.placeholders {
            &slide.placeholders
        } else {
            &slide.blocks
        };
        if lines.is_empty() {
            output.push_str(if args.placeholders {
                "(no placeholders found)\n"
            } else {
                "(no text found)\n"
            });
        }
        for line in lines {
            output.push_str(line);
            output.push('\n');
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slides() -> Vec<SlideText> {
        let mut first = SlideText::new(1);
        first.add_block("Client: {Client}");
        first.add_block("Revenue: {Rev} for {Client}");
        vec![first, SlideText::new(2)]
    }

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["pptgen-inspect", "deck.pptx"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_text_listing() {
        let output = render(&slides(), &args(&[])).unwrap();
        assert_eq!(
            output,
            "--- Slide 1 ---\nClient: {Client}\nRevenue: {Rev} for {Client}\n--- Slide 2 ---\n(no text found)\n"
        );
    }

    #[test]
    fn test_placeholder_listing() {
        let output = render(&slides(), &args(&["--placeholders"])).unwrap();
        assert_eq!(
            output,
            "--- Slide 1 ---\nClient\nRev\n--- Slide 2 ---\n(no placeholders found)\n"
        );
    }

    #[test]
    fn test_json_listing() {
        let output = render(&slides(), &args(&["--json", "--placeholders"])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["number"], 1);
        assert_eq!(value[0]["placeholders"], serde_json::json!(["Client", "Rev"]));
        assert_eq!(value[1]["placeholders"], serde_json::json!([]));

        let output = render(&slides(), &args(&["--json"])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["blocks"][1], "Revenue: {Rev} for {Client}");
    }
}
