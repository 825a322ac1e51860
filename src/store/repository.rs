/// Repository seam between the search components and the instrument store
use async_trait::async_trait;

use crate::error::Result;
use crate::types::Instrument;

/// Strike predicate. The master stores some strikes at x100 scale, so every
/// variant also matches at one hundred times the requested value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrikeFilter {
    Exact(f64),
    Range { lo: f64, hi: f64 },
}

/// Well-typed predicate set for filtered store queries
#[derive(Debug, Clone, Default)]
pub struct InstrumentFilter {
    pub underlying_id: Option<i64>,
    pub type_codes: Vec<i32>,
    pub expiry_month: Option<String>,
    pub expiry_day_prefix: Option<String>,
    pub display_contains: Option<String>,
    pub strike: Option<StrikeFilter>,
}

impl InstrumentFilter {
    pub fn new() -> Self {
        InstrumentFilter::default()
    }

    pub fn with_underlying(mut self, instrument_id: i64) -> Self {
        self.underlying_id = Some(instrument_id);
        self
    }

    pub fn with_types(mut self, type_codes: &[i32]) -> Self {
        self.type_codes = type_codes.to_vec();
        self
    }

    /// Expiry month tag, matched anywhere in the expiry date string
    pub fn with_expiry_month(mut self, month: &str) -> Self {
        self.expiry_month = Some(month.to_string());
        self
    }

    /// Expiry day, matched as a zero-padded prefix of the expiry date
    pub fn with_expiry_day(mut self, day: u32) -> Self {
        self.expiry_day_prefix = Some(format!("{:02}-", day));
        self
    }

    pub fn with_display_contains(mut self, text: &str) -> Self {
        self.display_contains = Some(text.to_string());
        self
    }

    pub fn with_strike(mut self, strike: StrikeFilter) -> Self {
        self.strike = Some(strike);
        self
    }
}

/// Read interface the resolver issues all store queries through
#[async_trait]
pub trait InstrumentRepository: Send + Sync {
    /// All instruments of the given types whose symbol equals the text,
    /// in the store's natural order
    async fn find_by_exact_symbol(&self, symbol: &str, type_codes: &[i32])
        -> Result<Vec<Instrument>>;

    /// All instruments of the given types whose symbol starts with the text
    async fn find_by_prefix(&self, prefix: &str, type_codes: &[i32]) -> Result<Vec<Instrument>>;

    /// Distinct symbols across the given types, first-seen order
    async fn find_distinct_symbols(&self, type_codes: &[i32]) -> Result<Vec<String>>;

    /// Whether any derivative lists the given instrument as its underlying
    async fn has_any_child_of(&self, instrument_id: i64) -> Result<bool>;

    /// All instruments matching the predicate set, capped at `limit`
    async fn find_by_filters(
        &self,
        filter: &InstrumentFilter,
        limit: usize,
    ) -> Result<Vec<Instrument>>;
}
