mod config;
mod error;
mod gemini;
mod heuristics;
mod readiness;

use std::fs;
use std::path::Path;

use config::{Config, ExtractConfig};
use gemini::GeminiClient;
use tracing::info;

const CONFIG_PATH: &str = ".config/receipt_extract.toml";

const USAGE: &str = "\
usage: receipt_extract <command>

commands:
  structure <text-file>             parse model output into structured fields
  query <text-file> <prompt>        answer a single-label question
  invoice <text-file>               fixed-pattern invoice extraction
  validate <image-or-pdf> [prompt]  upload to the model service and extract";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter("info")
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("structure") => {
            let path = args.get(2).ok_or(USAGE)?;
            let raw = fs::read_to_string(path)?;
            let doc = heuristics::structure_text(&heuristics::clean_model_text(&raw));
            info!(
                fields = doc.fields.len(),
                items = doc.items.len(),
                "Structured receipt text"
            );
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        Some("query") => {
            let path = args.get(2).ok_or(USAGE)?;
            let prompt = args.get(3).ok_or(USAGE)?;
            let raw = fs::read_to_string(path)?;
            println!("{}", heuristics::answer_query(&raw, prompt));
        }
        Some("invoice") => {
            let path = args.get(2).ok_or(USAGE)?;
            let cfg = ExtractConfig::load_or_default(CONFIG_PATH);
            let raw = fs::read_to_string(path)?;
            let invoice = heuristics::extract_invoice(&raw, cfg.row_policy)?;
            let (filled, total) = invoice.coverage();
            info!(
                filled,
                total,
                invoice_number = ?invoice.invoice_number,
                total_amount = ?invoice.total_amount,
                line_items = invoice.line_items.len(),
                "Invoice extraction result"
            );
            println!("{}", serde_json::to_string_pretty(&invoice)?);
        }
        Some("validate") => {
            let path = args.get(2).ok_or(USAGE)?;
            let prompt = args.get(3).map(String::as_str);
            let cfg = Config::load(CONFIG_PATH)?;
            run_validate(&cfg, Path::new(path), prompt).await?;
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}

/// The full pipeline: upload, wait for the file to become active,
/// transcribe, then structure (or answer the prompt).
async fn run_validate(
    cfg: &Config,
    path: &Path,
    prompt: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    let mime = guess_mime(path);
    info!(
        file = %path.display(),
        bytes = bytes.len(),
        mime = mime,
        "Uploading to model service"
    );

    let mut client = GeminiClient::new(&cfg.gemini);
    let file = client.upload_file(bytes, mime).await?;
    readiness::wait_until_active(&mut client, &file.name, &cfg.extract.poll_config()).await?;

    let raw = client.extract_text(&file).await?;

    match prompt {
        Some(p) => println!("{}", heuristics::answer_query(&raw, p)),
        None => {
            let doc = heuristics::structure_text(&heuristics::clean_model_text(&raw));
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }

    Ok(())
}

/// The service wants an explicit MIME type; PDFs are sent as-is,
/// anything else is assumed to be a photo of a receipt.
fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
