//! Dump the brushes of an ABR file as JSON
//!
//! Usage: cargo run --example abr_dump -- <file.abr> [cache-dir]

use std::path::PathBuf;

use sutu_abr::abr::{AbrParser, BrushSummary};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    sutu_abr::init_logging();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: abr_dump <file.abr> [cache-dir]");
        std::process::exit(2);
    };
    let cache_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);

    let brushes = AbrParser::load_file(&path, cache_dir)?;
    tracing::info!("{}: {} brushes", path.display(), brushes.len());

    let summaries: Vec<BrushSummary> = brushes.iter().map(|b| b.summary()).collect();
    println!("{}", serde_json::to_string_pretty(&summaries)?);

    Ok(())
}
