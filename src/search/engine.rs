/// Search orchestration: scenario selection, store queries, assembly
use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::search::derivatives::nearest_futures;
use crate::search::parser::parse_query;
use crate::search::ranking::RankedCandidate;
use crate::search::resolver::SymbolResolver;
use crate::store::{InstrumentFilter, InstrumentRepository, StrikeFilter};
use crate::types::{
    Config, Instrument, MatchKind, ParsedQuery, SearchMatch, SearchResponse, DERIVATIVE_TYPES,
    FUTURE_TYPES, OPTION_TYPES, UNDERLYING_TYPES,
};

// Ordinal priorities for pure-search assembly
const PRIORITY_HERO: u8 = 1;
const PRIORITY_FUTURES: u8 = 2;
const PRIORITY_PREFIX: u8 = 3;

/// Entry point for free-text instrument search
pub struct SearchEngine {
    repo: Arc<dyn InstrumentRepository>,
    resolver: SymbolResolver,
    config: Arc<Config>,
}

impl SearchEngine {
    pub fn new(repo: Arc<dyn InstrumentRepository>, config: Arc<Config>) -> Self {
        let resolver = SymbolResolver::new(Arc::clone(&repo), config.fuzzy_score_threshold);
        SearchEngine {
            repo,
            resolver,
            config,
        }
    }

    pub async fn search(&self, raw_query: &str) -> Result<SearchResponse> {
        let parsed = parse_query(raw_query);
        debug!("Parsed '{}' -> {:?}", raw_query, parsed);

        let (hero, is_typo_fixed) = self.resolver.resolve(&parsed.raw_symbol).await?;

        if parsed.is_pure_search() {
            self.pure_search(&parsed, hero, is_typo_fixed).await
        } else {
            self.filtered_search(parsed, hero, is_typo_fixed).await
        }
    }

    /// Name-only query: hero, its nearest futures, then prefix matches
    async fn pure_search(
        &self,
        parsed: &ParsedQuery,
        hero: Option<Instrument>,
        is_typo_fixed: bool,
    ) -> Result<SearchResponse> {
        let mut entries: Vec<(SearchMatch, u8)> = Vec::new();
        let mut seen_ids: HashSet<i64> = HashSet::new();

        if let Some(hero) = &hero {
            entries.push((underlying_match(hero), PRIORITY_HERO));
            seen_ids.insert(hero.instrument_id);

            let futures = nearest_futures(
                self.repo.as_ref(),
                hero.instrument_id,
                self.config.futures_limit,
            )
            .await?;
            for fut in futures {
                entries.push((
                    SearchMatch {
                        display_name: fut.display_name(),
                        symbol: fut.symbol.clone(),
                        kind: MatchKind::Fut,
                    },
                    PRIORITY_FUTURES,
                ));
            }
        }

        // A fuzzy-corrected hero means the typed text is not a real prefix
        if !is_typo_fixed {
            let mut partials = self
                .repo
                .find_by_prefix(&parsed.raw_symbol, &UNDERLYING_TYPES)
                .await?;
            partials.sort_by(|a, b| a.symbol.cmp(&b.symbol));
            partials.truncate(self.config.prefix_limit);

            for partial in partials {
                if seen_ids.insert(partial.instrument_id) {
                    entries.push((underlying_match(&partial), PRIORITY_PREFIX));
                }
            }
        }

        if entries.is_empty() {
            return Ok(SearchResponse::no_match(format!(
                "No symbol found matching '{}'",
                parsed.raw_symbol
            )));
        }

        // Stable sort guarantees hero -> futures -> prefix even if collected
        // out of order
        entries.sort_by_key(|(_, priority)| *priority);
        let matches = entries.into_iter().map(|(entry, _)| entry).collect();

        Ok(SearchResponse::universal(
            parsed.raw_symbol.clone(),
            is_typo_fixed,
            matches,
        ))
    }

    /// Structured hints present: filtered derivative search, or a global
    /// search when no underlying resolved
    async fn filtered_search(
        &self,
        parsed: ParsedQuery,
        hero: Option<Instrument>,
        is_typo_fixed: bool,
    ) -> Result<SearchResponse> {
        let base = self.build_filters(&parsed, hero.as_ref());
        let results = self.execute(&parsed, base).await?;

        let mut matches: Vec<SearchMatch> = Vec::new();
        if let Some(hero) = &hero {
            matches.push(SearchMatch {
                display_name: hero.display_name(),
                symbol: hero.symbol.clone(),
                kind: MatchKind::Spot,
            });
        }

        let mut ranked: Vec<RankedCandidate> = results
            .iter()
            .map(|inst| {
                RankedCandidate::score(inst, parsed.strike, self.config.strike_scale_multiplier)
            })
            .collect();
        ranked.sort_by(|a, b| a.cmp_by_sort_keys(b));
        ranked.truncate(self.config.result_limit);
        matches.extend(ranked.into_iter().map(RankedCandidate::into_match));

        let underlying = hero
            .as_ref()
            .map(|h| h.symbol.clone())
            .unwrap_or_else(|| "GLOBAL_SEARCH".to_string());

        Ok(SearchResponse::filtered(
            underlying,
            is_typo_fixed,
            parsed,
            matches,
        ))
    }

    /// Predicate set shared by the strict and fallback executions
    fn build_filters(&self, parsed: &ParsedQuery, hero: Option<&Instrument>) -> InstrumentFilter {
        let mut filter = InstrumentFilter::new();

        if let Some(hero) = hero {
            filter = filter.with_underlying(hero.instrument_id);
        }

        // Type precedence: futures tag, then strike, then day, then option
        // tag, defaulting to futures when nothing disambiguates
        if parsed.is_future {
            filter = filter.with_types(&FUTURE_TYPES);
        } else if parsed.strike.is_some() {
            filter = filter.with_types(&OPTION_TYPES);
        } else if parsed.expiry_day.is_some() {
            filter = filter.with_types(&DERIVATIVE_TYPES);
        } else if let Some(tag) = &parsed.opt_type {
            filter = filter
                .with_types(&OPTION_TYPES)
                .with_display_contains(tag);
        } else {
            filter = filter.with_types(&FUTURE_TYPES);
        }

        if let Some(month) = &parsed.expiry_month {
            filter = filter.with_expiry_month(month);
        }
        if let Some(day) = parsed.expiry_day {
            filter = filter.with_expiry_day(day);
        }

        filter
    }

    /// Strike queries try an exact match first (at either scale), then fall
    /// back to a percentage band around the target
    async fn execute(
        &self,
        parsed: &ParsedQuery,
        base: InstrumentFilter,
    ) -> Result<Vec<Instrument>> {
        let cap = self.config.store_query_cap;

        let Some(strike) = parsed.strike else {
            return self.repo.find_by_filters(&base, cap).await;
        };

        let mut strict = base.clone().with_strike(StrikeFilter::Exact(strike));
        if let Some(tag) = &parsed.opt_type {
            strict = strict.with_display_contains(tag);
        }
        let hits = self.repo.find_by_filters(&strict, cap).await?;
        if !hits.is_empty() {
            return Ok(hits);
        }

        let pct = self.config.strike_range_pct;
        let mut range = base.with_strike(StrikeFilter::Range {
            lo: strike * (1.0 - pct),
            hi: strike * (1.0 + pct),
        });
        if let Some(tag) = &parsed.opt_type {
            range = range.with_display_contains(tag);
        }
        self.repo.find_by_filters(&range, cap).await
    }
}

fn underlying_match(inst: &Instrument) -> SearchMatch {
    let kind = if inst.instrument_type == 2 {
        MatchKind::Index
    } else {
        MatchKind::Equity
    };
    SearchMatch {
        display_name: inst.display_name(),
        symbol: inst.symbol.clone(),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InstrumentStore;
    use crate::types::SearchStatus;

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            listen_addr: "127.0.0.1:0".to_string(),
            instrument_file: "data/instruments.json".to_string(),
            fuzzy_score_threshold: 80.0,
            strike_scale_multiplier: 5.0,
            strike_range_pct: 0.05,
            futures_limit: 3,
            prefix_limit: 10,
            result_limit: 10,
            store_query_cap: 50_000,
            test_case_file: "data/test_cases.json".to_string(),
            score_log_file: "data/score_runs.jsonl".to_string(),
            log_level: "info".to_string(),
        })
    }

    fn underlying(id: i64, instrument_type: i32, symbol: &str, display: &str) -> Instrument {
        Instrument {
            instrument_id: id,
            instrument_type,
            symbol: symbol.to_string(),
            display_symbol: Some(display.to_string()),
            exchange: Some(1),
            segment: Some(1),
            trading_symbol: Some(symbol.to_string()),
            isin: None,
            underlying_instrument_id: None,
            expiry_date: None,
            expiry_type: None,
            option_type: None,
            strike_price: None,
        }
    }

    fn future(id: i64, underlying_id: i64, symbol: &str, expiry: &str) -> Instrument {
        Instrument {
            instrument_id: id,
            instrument_type: 6,
            symbol: symbol.to_string(),
            display_symbol: Some(format!("{} {} FUT", symbol, expiry)),
            exchange: None,
            segment: Some(2),
            trading_symbol: Some(symbol.to_string()),
            isin: None,
            underlying_instrument_id: Some(underlying_id),
            expiry_date: Some(expiry.to_string()),
            expiry_type: Some(1),
            option_type: None,
            strike_price: None,
        }
    }

    fn option(
        id: i64,
        underlying_id: i64,
        instrument_type: i32,
        symbol: &str,
        expiry: &str,
        strike: f64,
        tag: &str,
    ) -> Instrument {
        Instrument {
            instrument_id: id,
            instrument_type,
            symbol: symbol.to_string(),
            display_symbol: Some(format!("{} {} {} {}", symbol, expiry, strike, tag)),
            exchange: None,
            segment: Some(2),
            trading_symbol: Some(symbol.to_string()),
            isin: None,
            underlying_instrument_id: Some(underlying_id),
            expiry_date: Some(expiry.to_string()),
            expiry_type: Some(1),
            option_type: Some(if tag == "CE" { 3 } else { 4 }),
            strike_price: Some(strike),
        }
    }

    async fn nifty_universe() -> SearchEngine {
        let store = Arc::new(InstrumentStore::new());
        store
            .replace_all(vec![
                underlying(1, 2, "NIFTY", "NIFTY 50"),
                underlying(2, 1, "NIFTYBEES", "NIPPON NIFTY BEES"),
                underlying(3, 2, "NIFTYNXT50", "NIFTY NEXT 50"),
                underlying(4, 1, "RELIANCE", "RELIANCE INDUSTRIES"),
                underlying(5, 2, "BANKNIFTY", "NIFTY BANK"),
                future(10, 1, "NIFTY", "27-JAN-26"),
                future(11, 1, "NIFTY", "24-FEB-26"),
                future(12, 1, "NIFTY", "31-MAR-26"),
                future(13, 1, "NIFTY", "28-APR-26"),
                future(14, 5, "BANKNIFTY", "27-JAN-26"),
                option(20, 1, 5, "NIFTY", "27-JAN-26", 26000.0, "CE"),
                option(21, 1, 5, "NIFTY", "24-FEB-26", 26000.0, "CE"),
                option(22, 1, 5, "NIFTY", "27-JAN-26", 26000.0, "PE"),
                option(23, 1, 5, "NIFTY", "27-JAN-26", 26500.0, "CE"),
                option(24, 1, 5, "NIFTY", "27-JAN-26", 2610000.0, "CE"),
                option(25, 5, 5, "BANKNIFTY", "27-JAN-26", 59000.0, "CE"),
                option(26, 4, 3, "RELIANCE", "20-JAN-26", 1400.0, "CE"),
            ])
            .await;
        SearchEngine::new(store, test_config())
    }

    #[tokio::test]
    async fn test_pure_search_nifty() {
        let engine = nifty_universe().await;
        let response = engine.search("nifty").await.unwrap();

        assert_eq!(response.status, SearchStatus::Success);
        assert_eq!(response.result_type.as_deref(), Some("UNIVERSAL_SEARCH"));
        assert_eq!(response.underlying.as_deref(), Some("NIFTY"));
        assert_eq!(response.is_typo_fixed, Some(false));

        // Hero first, tagged by its instrument type
        assert_eq!(response.matches[0].symbol, "NIFTY");
        assert_eq!(response.matches[0].kind, MatchKind::Index);
        assert_eq!(response.matches[0].display_name, "NIFTY 50");

        // Then at most three futures, nearest expiry first
        let futures: Vec<&SearchMatch> = response
            .matches
            .iter()
            .filter(|m| m.kind == MatchKind::Fut)
            .collect();
        assert_eq!(futures.len(), 3);
        assert_eq!(futures[0].display_name, "NIFTY 27-JAN-26 FUT");
        assert_eq!(futures[1].display_name, "NIFTY 24-FEB-26 FUT");
        assert_eq!(futures[2].display_name, "NIFTY 31-MAR-26 FUT");

        // Then prefix matches, hero excluded
        let tail: Vec<&str> = response.matches[4..]
            .iter()
            .map(|m| m.symbol.as_str())
            .collect();
        assert_eq!(tail, vec!["NIFTYBEES", "NIFTYNXT50"]);
    }

    #[tokio::test]
    async fn test_pure_search_unknown_symbol_is_no_match() {
        let engine = nifty_universe().await;
        let response = engine.search("zzzqqq").await.unwrap();
        assert_eq!(response.status, SearchStatus::NoMatch);
        assert!(response.message.unwrap().contains("ZZZQQQ"));
        assert!(response.matches.is_empty());
    }

    #[tokio::test]
    async fn test_fuzzy_fix_suppresses_prefix_matches() {
        let engine = nifty_universe().await;
        // One substitution away from RELIANCE
        let response = engine.search("relianxe").await.unwrap();
        assert_eq!(response.status, SearchStatus::Success);
        assert_eq!(response.is_typo_fixed, Some(true));
        assert_eq!(response.matches[0].symbol, "RELIANCE");
        // No prefix entries when the hero came from a typo fix
        assert!(response
            .matches
            .iter()
            .all(|m| m.kind != MatchKind::Equity || m.symbol == "RELIANCE"));
    }

    #[tokio::test]
    async fn test_futures_query_returns_spot_and_futures_only() {
        let engine = nifty_universe().await;
        let response = engine.search("nifty fut").await.unwrap();

        assert_eq!(response.status, SearchStatus::Success);
        assert_eq!(response.underlying.as_deref(), Some("NIFTY"));
        assert_eq!(response.matches[0].kind, MatchKind::Spot);
        assert!(response.matches[1..]
            .iter()
            .all(|m| m.kind == MatchKind::Fut));
        assert!(response.search_parsed.is_some());
    }

    #[tokio::test]
    async fn test_strike_query_spot_then_nearest_expiry() {
        let engine = nifty_universe().await;
        let response = engine.search("nifty 26000").await.unwrap();

        assert_eq!(response.matches[0].kind, MatchKind::Spot);
        assert_eq!(response.matches[0].symbol, "NIFTY");

        let options: Vec<&SearchMatch> = response.matches[1..].iter().collect();
        assert!(!options.is_empty());
        assert!(options.iter().all(|m| m.kind == MatchKind::Opt));
        // exact strike hits only, January legs ahead of February
        assert_eq!(options[0].display_name, "NIFTY 27-JAN-26 26000 CE");
        assert_eq!(options[1].display_name, "NIFTY 27-JAN-26 26000 PE");
        assert_eq!(options[2].display_name, "NIFTY 24-FEB-26 26000 CE");
    }

    #[tokio::test]
    async fn test_k_notation_matches_plain_strike() {
        let engine = nifty_universe().await;
        let plain = engine.search("nifty 26000").await.unwrap();
        let k_form = engine.search("nifty 26k").await.unwrap();
        let plain_names: Vec<&String> = plain.matches.iter().map(|m| &m.display_name).collect();
        let k_names: Vec<&String> = k_form.matches.iter().map(|m| &m.display_name).collect();
        assert_eq!(plain_names, k_names);
    }

    #[tokio::test]
    async fn test_scale_ambiguous_strike_found_at_x100() {
        let engine = nifty_universe().await;
        // 26100 only exists as a 2610000 row in the store
        let response = engine.search("nifty 26100").await.unwrap();
        let options: Vec<&SearchMatch> = response.matches[1..].iter().collect();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].display_name, "NIFTY 27-JAN-26 2610000 CE");
    }

    #[tokio::test]
    async fn test_strike_fallback_to_range() {
        let engine = nifty_universe().await;
        // No exact 26300 row; the 5% band picks up 26000 and 26500
        let response = engine.search("nifty 26300").await.unwrap();
        let options: Vec<&SearchMatch> = response.matches[1..].iter().collect();
        assert!(!options.is_empty());
        assert!(options
            .iter()
            .all(|m| m.display_name.contains("26000")
                || m.display_name.contains("26500")
                || m.display_name.contains("2610000")));
    }

    #[tokio::test]
    async fn test_option_tag_filters_display_name() {
        let engine = nifty_universe().await;
        let response = engine.search("nifty 26000 pe").await.unwrap();
        let options: Vec<&SearchMatch> = response.matches[1..].iter().collect();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].display_name, "NIFTY 27-JAN-26 26000 PE");
    }

    #[tokio::test]
    async fn test_global_search_without_symbol() {
        let engine = nifty_universe().await;
        let response = engine.search("20 jan").await.unwrap();

        assert_eq!(response.status, SearchStatus::Success);
        assert_eq!(response.underlying.as_deref(), Some("GLOBAL_SEARCH"));
        let parsed = response.search_parsed.as_ref().unwrap();
        assert_eq!(parsed.expiry_day, Some(20));
        assert_eq!(parsed.expiry_month.as_deref(), Some("JAN"));

        // Matches drawn across underlyings, all on 20-JAN
        assert!(!response.matches.is_empty());
        assert!(response
            .matches
            .iter()
            .all(|m| m.display_name.contains("20-JAN-26")));
    }

    #[tokio::test]
    async fn test_global_search_with_no_hits_still_succeeds() {
        let engine = nifty_universe().await;
        let response = engine.search("25 dec").await.unwrap();
        assert_eq!(response.status, SearchStatus::Success);
        assert_eq!(response.underlying.as_deref(), Some("GLOBAL_SEARCH"));
        assert!(response.matches.is_empty());
    }

    #[tokio::test]
    async fn test_month_only_query_defaults_to_futures() {
        let engine = nifty_universe().await;
        let response = engine.search("nifty jan").await.unwrap();
        assert_eq!(response.matches[0].kind, MatchKind::Spot);
        let rest: Vec<&SearchMatch> = response.matches[1..].iter().collect();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].display_name, "NIFTY 27-JAN-26 FUT");
    }

    #[tokio::test]
    async fn test_rank_orders_global_results() {
        let engine = nifty_universe().await;
        // Day+month filter across underlyings: NIFTY legs outrank BANKNIFTY
        let response = engine.search("27 jan").await.unwrap();
        let names: Vec<&str> = response
            .matches
            .iter()
            .map(|m| m.display_name.as_str())
            .collect();
        let nifty_pos = names
            .iter()
            .position(|n| n.starts_with("NIFTY 27-JAN-26"))
            .unwrap();
        let bank_pos = names
            .iter()
            .position(|n| n.starts_with("BANKNIFTY"))
            .unwrap();
        assert!(nifty_pos < bank_pos);
    }

    #[tokio::test]
    async fn test_result_limit_honored() {
        let store = Arc::new(InstrumentStore::new());
        let mut rows = vec![underlying(1, 2, "NIFTY", "NIFTY 50")];
        for i in 0..30 {
            rows.push(option(
                100 + i,
                1,
                5,
                "NIFTY",
                "27-JAN-26",
                26000.0 + i as f64,
                "CE",
            ));
        }
        store.replace_all(rows).await;
        let engine = SearchEngine::new(store, test_config());

        // No exact 26300 row, so the range fallback sweeps up all 30 strikes
        let response = engine.search("nifty 26300").await.unwrap();
        assert_eq!(response.matches[0].kind, MatchKind::Spot);
        // SPOT plus exactly result_limit ranked entries
        assert_eq!(response.matches.len(), 11);
    }
}
