/// Core type definitions for the instrument search service
use serde::{Deserialize, Serialize};

/// Instrument row from the processed symbol master
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    #[serde(rename = "InstrumentId")]
    pub instrument_id: i64,
    #[serde(rename = "InstrumentType")]
    pub instrument_type: i32,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "DisplaySymbol")]
    pub display_symbol: Option<String>,
    #[serde(rename = "Exchange")]
    pub exchange: Option<i32>,
    #[serde(rename = "Segment")]
    pub segment: Option<i32>,
    #[serde(rename = "TradingSymbol")]
    pub trading_symbol: Option<String>,
    #[serde(rename = "Isin")]
    pub isin: Option<String>,
    #[serde(rename = "UnderlyingInstrumentId")]
    pub underlying_instrument_id: Option<i64>,
    #[serde(rename = "ExpiryDate")]
    pub expiry_date: Option<String>,
    #[serde(rename = "ExpiryType")]
    pub expiry_type: Option<i32>,
    #[serde(rename = "OptionType")]
    pub option_type: Option<i32>,
    #[serde(rename = "StrikePrice")]
    pub strike_price: Option<f64>,
}

impl Instrument {
    pub fn kind(&self) -> Option<InstrumentKind> {
        InstrumentKind::from_code(self.instrument_type)
    }

    /// Futures legs: stock futures and index futures
    pub fn is_future(&self) -> bool {
        matches!(self.instrument_type, 4 | 6)
    }

    /// Option legs: stock options and index options
    pub fn is_option(&self) -> bool {
        matches!(self.instrument_type, 3 | 5)
    }

    /// Cash instruments that derivatives are written against
    pub fn is_underlying(&self) -> bool {
        matches!(self.instrument_type, 1 | 2)
    }

    /// Human-friendly name, falling back to the raw symbol
    pub fn display_name(&self) -> String {
        self.display_symbol
            .clone()
            .unwrap_or_else(|| self.symbol.clone())
    }
}

/// Instrument type codes as they appear in the symbol master
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentKind {
    Equity = 1,
    Index = 2,
    StockOption = 3,
    StockFuture = 4,
    IndexOption = 5,
    IndexFuture = 6,
}

impl InstrumentKind {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(InstrumentKind::Equity),
            2 => Some(InstrumentKind::Index),
            3 => Some(InstrumentKind::StockOption),
            4 => Some(InstrumentKind::StockFuture),
            5 => Some(InstrumentKind::IndexOption),
            6 => Some(InstrumentKind::IndexFuture),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        *self as i32
    }
}

/// Type codes for the cash instruments a symbol can resolve to
pub const UNDERLYING_TYPES: [i32; 2] = [1, 2];
/// Type codes for futures legs
pub const FUTURE_TYPES: [i32; 2] = [4, 6];
/// Type codes for option legs
pub const OPTION_TYPES: [i32; 2] = [3, 5];
/// Type codes for every derivative leg
pub const DERIVATIVE_TYPES: [i32; 4] = [3, 4, 5, 6];

/// Structured hints extracted from a raw search phrase
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub raw_symbol: String,
    pub strike: Option<f64>,
    pub expiry_month: Option<String>,
    pub expiry_day: Option<u32>,
    pub opt_type: Option<String>,
    pub is_future: bool,
}

impl ParsedQuery {
    /// A pure search carries a name and nothing else
    pub fn is_pure_search(&self) -> bool {
        self.strike.is_none()
            && !self.is_future
            && self.opt_type.is_none()
            && self.expiry_month.is_none()
            && self.expiry_day.is_none()
    }
}

/// Response status for a search request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Success,
    NoMatch,
}

/// Classification of a single match in the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchKind {
    Equity,
    Index,
    Fut,
    Opt,
    Spot,
}

impl MatchKind {
    pub fn as_str(&self) -> &str {
        match self {
            MatchKind::Equity => "EQUITY",
            MatchKind::Index => "INDEX",
            MatchKind::Fut => "FUT",
            MatchKind::Opt => "OPT",
            MatchKind::Spot => "SPOT",
        }
    }
}

/// One entry in the response match list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
    pub display_name: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: MatchKind,
}

/// Assembled search response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub status: SearchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlying: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_typo_fixed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_parsed: Option<ParsedQuery>,
    #[serde(default)]
    pub matches: Vec<SearchMatch>,
}

impl SearchResponse {
    pub fn no_match(message: String) -> Self {
        SearchResponse {
            status: SearchStatus::NoMatch,
            message: Some(message),
            result_type: None,
            underlying: None,
            is_typo_fixed: None,
            search_parsed: None,
            matches: Vec::new(),
        }
    }

    /// Pure-search response: hero, its futures, then prefix matches
    pub fn universal(underlying: String, is_typo_fixed: bool, matches: Vec<SearchMatch>) -> Self {
        SearchResponse {
            status: SearchStatus::Success,
            message: None,
            result_type: Some("UNIVERSAL_SEARCH".to_string()),
            underlying: Some(underlying),
            is_typo_fixed: Some(is_typo_fixed),
            search_parsed: None,
            matches,
        }
    }

    /// Filtered or global derivative search response
    pub fn filtered(
        underlying: String,
        is_typo_fixed: bool,
        parsed: ParsedQuery,
        matches: Vec<SearchMatch>,
    ) -> Self {
        SearchResponse {
            status: SearchStatus::Success,
            message: None,
            result_type: None,
            underlying: Some(underlying),
            is_typo_fixed: Some(is_typo_fixed),
            search_parsed: Some(parsed),
            matches,
        }
    }
}

/// Configuration for the search service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub listen_addr: String,

    // Instrument store
    pub instrument_file: String,

    // Symbol resolution
    pub fuzzy_score_threshold: f64,

    // Strike heuristics (the master stores some strikes at x100 scale)
    pub strike_scale_multiplier: f64,
    pub strike_range_pct: f64,

    // Result shaping
    pub futures_limit: usize,
    pub prefix_limit: usize,
    pub result_limit: usize,
    pub store_query_cap: usize,

    // Scoring harness
    pub test_case_file: String,
    pub score_log_file: String,

    // Logging
    pub log_level: String,
}
