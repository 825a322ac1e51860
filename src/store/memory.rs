/// In-memory instrument store for fast lookups
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::Result;
use crate::store::repository::{InstrumentFilter, InstrumentRepository, StrikeFilter};
use crate::types::Instrument;

/// Instrument store backed by the processed symbol master.
///
/// Rows are immutable between loads; `replace_all` is the only writer and
/// swaps the whole table (truncate-then-insert), so concurrent readers never
/// observe a partial load.
pub struct InstrumentStore {
    instruments: Arc<RwLock<Vec<Instrument>>>,
    parent_ids: Arc<RwLock<HashSet<i64>>>,
}

impl InstrumentStore {
    pub fn new() -> Self {
        InstrumentStore {
            instruments: Arc::new(RwLock::new(Vec::new())),
            parent_ids: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Bulk load: wipe the table and insert the new rows
    pub async fn replace_all(&self, rows: Vec<Instrument>) {
        // Index underlying ids that actually have derivative children
        let mut parents = HashSet::new();
        for inst in &rows {
            if let Some(underlying_id) = inst.underlying_instrument_id {
                parents.insert(underlying_id);
            }
        }

        {
            let mut table = self.instruments.write().await;
            *table = rows;
        }
        {
            let mut index = self.parent_ids.write().await;
            *index = parents;
        }
    }

    /// Load the processed symbol master from disk
    pub async fn load_from_file(&self, path: &str) -> Result<()> {
        let content = tokio::fs::read_to_string(path).await?;
        let rows: Vec<Instrument> = serde_json::from_str(&content)?;

        info!("📥 Loading {} instruments into store", rows.len());
        self.replace_all(rows).await;

        Ok(())
    }

    pub async fn size(&self) -> usize {
        let table = self.instruments.read().await;
        table.len()
    }
}

impl Default for InstrumentStore {
    fn default() -> Self {
        InstrumentStore::new()
    }
}

fn matches_strike(stored: Option<f64>, filter: StrikeFilter) -> bool {
    let Some(strike) = stored else {
        return false;
    };
    match filter {
        StrikeFilter::Exact(value) => strike == value || strike == value * 100.0,
        StrikeFilter::Range { lo, hi } => {
            (strike >= lo && strike <= hi) || (strike >= lo * 100.0 && strike <= hi * 100.0)
        }
    }
}

fn matches_filter(inst: &Instrument, filter: &InstrumentFilter) -> bool {
    if let Some(underlying_id) = filter.underlying_id {
        if inst.underlying_instrument_id != Some(underlying_id) {
            return false;
        }
    }

    if !filter.type_codes.is_empty() && !filter.type_codes.contains(&inst.instrument_type) {
        return false;
    }

    if let Some(month) = &filter.expiry_month {
        let hit = inst
            .expiry_date
            .as_ref()
            .map_or(false, |expiry| expiry.contains(month.as_str()));
        if !hit {
            return false;
        }
    }

    if let Some(day_prefix) = &filter.expiry_day_prefix {
        let hit = inst
            .expiry_date
            .as_ref()
            .map_or(false, |expiry| expiry.starts_with(day_prefix.as_str()));
        if !hit {
            return false;
        }
    }

    if let Some(text) = &filter.display_contains {
        let hit = inst
            .display_symbol
            .as_ref()
            .map_or(false, |display| display.contains(text.as_str()));
        if !hit {
            return false;
        }
    }

    if let Some(strike_filter) = filter.strike {
        if !matches_strike(inst.strike_price, strike_filter) {
            return false;
        }
    }

    true
}

#[async_trait]
impl InstrumentRepository for InstrumentStore {
    async fn find_by_exact_symbol(
        &self,
        symbol: &str,
        type_codes: &[i32],
    ) -> Result<Vec<Instrument>> {
        let table = self.instruments.read().await;
        Ok(table
            .iter()
            .filter(|inst| inst.symbol == symbol && type_codes.contains(&inst.instrument_type))
            .cloned()
            .collect())
    }

    async fn find_by_prefix(&self, prefix: &str, type_codes: &[i32]) -> Result<Vec<Instrument>> {
        let table = self.instruments.read().await;
        Ok(table
            .iter()
            .filter(|inst| {
                inst.symbol.starts_with(prefix) && type_codes.contains(&inst.instrument_type)
            })
            .cloned()
            .collect())
    }

    async fn find_distinct_symbols(&self, type_codes: &[i32]) -> Result<Vec<String>> {
        let table = self.instruments.read().await;
        let mut seen = HashSet::new();
        let mut symbols = Vec::new();
        for inst in table.iter() {
            if type_codes.contains(&inst.instrument_type) && seen.insert(inst.symbol.clone()) {
                symbols.push(inst.symbol.clone());
            }
        }
        Ok(symbols)
    }

    async fn has_any_child_of(&self, instrument_id: i64) -> Result<bool> {
        let index = self.parent_ids.read().await;
        Ok(index.contains(&instrument_id))
    }

    async fn find_by_filters(
        &self,
        filter: &InstrumentFilter,
        limit: usize,
    ) -> Result<Vec<Instrument>> {
        let table = self.instruments.read().await;
        Ok(table
            .iter()
            .filter(|inst| matches_filter(inst, filter))
            .take(limit)
            .cloned()
            .collect())
    }
}
