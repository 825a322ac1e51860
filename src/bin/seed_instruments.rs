/// Bulk-load pipeline: transform the raw symbol master into the store file
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tradesearch::store::transform_master;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let input = args.get(1).map(String::as_str).unwrap_or("symbol_info_list.json");
    let output = args.get(2).map(String::as_str).unwrap_or("data/instruments.json");

    info!("📂 Reading {}...", input);
    let raw = std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))?;
    let rows: Vec<serde_json::Value> = serde_json::from_str(&raw)?;

    info!("⚙️  Transforming {} raw rows...", rows.len());
    let start = Instant::now();
    let report = transform_master(&rows)?;
    info!(
        "🗑️  Skipped {} rows outside instrument types 1-6",
        report.skipped
    );

    if let Some(parent) = Path::new(output).parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, serde_json::to_string_pretty(&report.instruments)?)?;

    info!(
        "✅ Success! Wrote {} instruments to {} in {:.2}s",
        report.instruments.len(),
        output,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
