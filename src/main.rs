//! pdf-table-writer CLI - render a JSON table description to PDF

use std::fs::File;
use std::io::{self, BufWriter};
use anyhow::Context;
use clap::Parser;
use log::{log, Level};
use pdf_table_writer::{generate_pdf_table, ConfigSource, Outcome};

#[derive(Parser)]
#[command(name = "pdf-table-writer")]
#[command(author, version, about = "Paginated PDF tables from JSON rows", long_about = None)]
struct Cli {
    /// Table description (JSON)
    #[arg(short, long)]
    config: String,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let source = ConfigSource::from_path(&cli.config)
        .with_context(|| format!("reading table config {}", cli.config))?;
    let mut source = match &cli.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path))?;
            source.with_writer(BufWriter::new(file))
        }
        None => source.with_writer(io::stdout()),
    };

    let (level, message) = summary(generate_pdf_table(&mut source).context("writing PDF")?);
    log!(level, "{}", message);
    Ok(())
}

fn summary(outcome: Outcome) -> (Level, String) {
    match outcome {
        Outcome::Rendered { pages } => (Level::Info, format!("Wrote {} page(s)", pages)),
        Outcome::Skipped(reason) => (Level::Warn, format!("Nothing rendered: {:?}", reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_table_writer::SkipReason;

    #[test]
    fn test_skips_are_warnings() {
        assert_eq!(summary(Outcome::Rendered { pages: 3 }), (Level::Info, "Wrote 3 page(s)".to_string()));
        assert_eq!(
            summary(Outcome::Skipped(SkipReason::NoColumns)),
            (Level::Warn, "Nothing rendered: NoColumns".to_string())
        );
    }
}
