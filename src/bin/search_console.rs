/// Interactive console for exercising the search engine
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use tradesearch::config::load_config;
use tradesearch::search::SearchEngine;
use tradesearch::store::{InstrumentRepository, InstrumentStore};
use tradesearch::types::{SearchResponse, SearchStatus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keep the prompt clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .init();

    let config = Arc::new(load_config("config.toml")?);
    let store = Arc::new(InstrumentStore::new());
    store.load_from_file(&config.instrument_file).await?;
    let count = store.size().await;

    let repo: Arc<dyn InstrumentRepository> = store;
    let engine = SearchEngine::new(repo, Arc::clone(&config));

    println!("\n{}", "=".repeat(50));
    println!("   MARKET SEARCH TOOL ({} instruments)", count);
    println!("   Try: 'Reliance', 'Jan 26000', 'Nifty Jan Fut'");
    println!("   Type 'exit' to quit.");
    println!("{}\n", "=".repeat(50));

    let stdin = io::stdin();
    loop {
        print!("Search > ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        match engine.search(query).await {
            Ok(result) => print_result(&result),
            Err(err) => println!("❌ Search failed: {}\n", err),
        }
    }

    Ok(())
}

fn print_result(result: &SearchResponse) {
    if result.status == SearchStatus::NoMatch {
        println!("❌ {}\n", result.message.as_deref().unwrap_or("No match"));
        return;
    }

    println!(
        "\n✅ Intent Parsed: {}",
        result.result_type.as_deref().unwrap_or("DERIVATIVES")
    );
    println!("   Underlying: {}", result.underlying.as_deref().unwrap_or("-"));

    if let Some(parsed) = &result.search_parsed {
        let expiry = parsed.expiry_month.as_deref().unwrap_or("-");
        let strike = parsed
            .strike
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("   Filters: Exp[{}] Strike[{}]", expiry, strike);
    }

    if result.matches.is_empty() {
        println!("   ⚠️  No specific instruments found matching criteria.");
    } else {
        println!("\n   {:<25} {:<10} {}", "SYMBOL", "TYPE", "DISPLAY NAME");
        println!("   {}", "-".repeat(60));
        for entry in &result.matches {
            println!(
                "   {:<25} {:<10} {}",
                entry.symbol,
                entry.kind.as_str(),
                entry.display_name
            );
        }
    }

    println!("\n");
}
