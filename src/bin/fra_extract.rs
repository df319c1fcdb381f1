use clap::Parser;
use fra_monitor::core::extraction::{extract_fra_fields, text_excerpt};
use fra_monitor::utils::logger;
use serde_json::json;

#[derive(Parser)]
#[command(name = "fra-extract")]
#[command(about = "Pull FRA claim fields out of OCR'd document text")]
struct Args {
    /// Text files produced by OCR
    #[arg(required = true)]
    files: Vec<String>,

    /// Characters of source text to include with each result
    #[arg(long, default_value = "200")]
    excerpt: usize,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let mut results = Vec::with_capacity(args.files.len());
    for file in &args.files {
        let text = std::fs::read_to_string(file)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", file, e))?;
        let fields = extract_fra_fields(&text);
        tracing::info!("Processed {} ({} characters)", file, text.chars().count());
        results.push(json!({
            "file": file,
            "fields": fields,
            "text": text_excerpt(&text, args.excerpt),
        }));
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
