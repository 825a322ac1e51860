/// Regression harness: run the master test cases and score the ranked output
use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tradesearch::config::load_config;
use tradesearch::search::SearchEngine;
use tradesearch::store::{InstrumentRepository, InstrumentStore};
use tradesearch::types::SearchStatus;

#[derive(Debug, Deserialize)]
struct TestCase {
    test_id: String,
    #[allow(dead_code)]
    description: String,
    user_input: String,
    expected: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CaseResult {
    test_id: String,
    user_input: String,
    expected: Vec<String>,
    actual: Vec<String>,
    score: i32,
    status: String,
    mistakes: String,
}

#[derive(Debug, Serialize)]
struct RunRecord {
    run_timestamp: DateTime<Utc>,
    total_cases: usize,
    average_score: i32,
    status_summary: String,
    results: Vec<CaseResult>,
}

/// Score one case: 10 points per missing/extra entry, 5 per position
/// mismatch, floored at zero
fn score_case(expected: &[String], actual: &[String]) -> (i32, String) {
    let mut score = 100i32;
    let mut errors: Vec<String> = Vec::new();

    let expected_set: HashSet<&String> = expected.iter().collect();
    let actual_set: HashSet<&String> = actual.iter().collect();

    // Set differences: repeated display names count once
    let mut seen = HashSet::new();
    let missing: Vec<&str> = expected
        .iter()
        .filter(|e| !actual_set.contains(*e) && seen.insert(e.as_str()))
        .map(String::as_str)
        .collect();
    let mut seen = HashSet::new();
    let extra: Vec<&str> = actual
        .iter()
        .filter(|a| !expected_set.contains(*a) && seen.insert(a.as_str()))
        .map(String::as_str)
        .collect();

    if !missing.is_empty() {
        score -= missing.len() as i32 * 10;
        errors.push(format!("Missing {} items: {}", missing.len(), missing.join(", ")));
    }
    if !extra.is_empty() {
        score -= extra.len() as i32 * 10;
        errors.push(format!("Extra {} items: {}", extra.len(), extra.join(", ")));
    }

    if score > 0 {
        let mut sequence_errors = Vec::new();
        for (idx, want) in expected.iter().enumerate() {
            if let Some(got) = actual.get(idx) {
                if got != want {
                    score -= 5;
                    sequence_errors.push(format!("Pos {}: Expected '{}' != Got '{}'", idx, want, got));
                }
            }
        }
        if !sequence_errors.is_empty() {
            errors.push(format!("Sequence Errors: {}", sequence_errors.join("; ")));
        }
    }

    let mistakes = if errors.is_empty() {
        "None".to_string()
    } else {
        errors.join(" | ")
    };
    (score.max(0), mistakes)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .init();

    let config = Arc::new(load_config("config.toml")?);

    let store = Arc::new(InstrumentStore::new());
    store.load_from_file(&config.instrument_file).await?;
    info!("✅ Loaded {} instruments", store.size().await);

    let repo: Arc<dyn InstrumentRepository> = store;
    let engine = SearchEngine::new(repo, Arc::clone(&config));

    let cases_raw = std::fs::read_to_string(&config.test_case_file)
        .with_context(|| format!("Failed to read {}", config.test_case_file))?;
    let cases: Vec<TestCase> = serde_json::from_str(&cases_raw)?;

    println!("\nRunning {} test cases...", cases.len());
    println!("{}", "-".repeat(80));
    println!(
        "{:<8} {:<15} {:<8} {:<8} {}",
        "ID", "INPUT", "SCORE", "STATUS", "MISTAKES"
    );
    println!("{}", "-".repeat(80));

    let mut results = Vec::new();
    let mut run_total = 0i64;

    for case in &cases {
        let actual_full: Vec<String> = match engine.search(&case.user_input).await {
            Ok(response) if response.status == SearchStatus::Success => response
                .matches
                .iter()
                .map(|m| m.display_name.clone())
                .collect(),
            Ok(_) => Vec::new(),
            Err(err) => {
                error!("Crash in {}: {}", case.test_id, err);
                Vec::new()
            }
        };

        // Slice actual to the expected length for comparison
        let actual: Vec<String> = actual_full
            .into_iter()
            .take(case.expected.len())
            .collect();

        let (score, mistakes) = score_case(&case.expected, &actual);
        let status = if score == 100 { "PASS" } else { "FAIL" };
        run_total += score as i64;

        let mistakes_display = if mistakes.chars().count() > 40 {
            format!("{}...", mistakes.chars().take(40).collect::<String>())
        } else {
            mistakes.clone()
        };
        println!(
            "{:<8} {:<15} {:<8} {:<8} {}",
            case.test_id, case.user_input, score, status, mistakes_display
        );

        results.push(CaseResult {
            test_id: case.test_id.clone(),
            user_input: case.user_input.clone(),
            expected: case.expected.clone(),
            actual,
            score,
            status: status.to_string(),
            mistakes,
        });
    }

    let average = if cases.is_empty() {
        0
    } else {
        (run_total / cases.len() as i64) as i32
    };

    let record = RunRecord {
        run_timestamp: Utc::now(),
        total_cases: cases.len(),
        average_score: average,
        status_summary: "COMPLETED".to_string(),
        results,
    };
    append_run_record(&config.score_log_file, &record).await?;

    println!("{}", "-".repeat(80));
    println!("Run Completed. Average Score: {}/100", average);

    Ok(())
}

/// Append the run as one JSON line, creating the log file on first use
async fn append_run_record(path: &str, record: &RunRecord) -> anyhow::Result<()> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json_line = serde_json::to_string(record)?;
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(format!("{}\n", json_line).as_bytes()).await?;
    Ok(())
}
