/// Symbol resolution: maps cleaned query text to one underlying instrument
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::store::InstrumentRepository;
use crate::types::{Instrument, InstrumentKind, UNDERLYING_TYPES};

/// Similarity on the 0-100 scale the resolver threshold is expressed in
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Three-tier symbol resolver: exact, prefix, then fuzzy.
///
/// The exact tier also untangles the "twin problem": the same ticker listed
/// on two exchanges, where at most one listing is the real derivatives
/// parent.
pub struct SymbolResolver {
    repo: Arc<dyn InstrumentRepository>,
    fuzzy_score_threshold: f64,
}

impl SymbolResolver {
    pub fn new(repo: Arc<dyn InstrumentRepository>, fuzzy_score_threshold: f64) -> Self {
        SymbolResolver {
            repo,
            fuzzy_score_threshold,
        }
    }

    /// Returns the resolved instrument (if any) and whether the fuzzy tier
    /// corrected a typo to get there.
    pub async fn resolve(&self, symbol_text: &str) -> Result<(Option<Instrument>, bool)> {
        if symbol_text.is_empty() {
            return Ok((None, false));
        }

        // Tier 1: exact match
        let exact = self
            .repo
            .find_by_exact_symbol(symbol_text, &UNDERLYING_TYPES)
            .await?;
        if !exact.is_empty() {
            if exact.len() > 1 {
                // Twin problem: same ticker on two exchanges. In store
                // order: an index listing wins immediately, otherwise the
                // first listing with any derivative child.
                for candidate in &exact {
                    if candidate.instrument_type == InstrumentKind::Index.code() {
                        return Ok((Some(candidate.clone()), false));
                    }
                    if self.repo.has_any_child_of(candidate.instrument_id).await? {
                        return Ok((Some(candidate.clone()), false));
                    }
                }
                // No listing proved parentage; default to the first
            }
            return Ok((exact.into_iter().next(), false));
        }

        // Tier 2: prefix match, shortest symbol wins
        let mut candidates = self
            .repo
            .find_by_prefix(symbol_text, &UNDERLYING_TYPES)
            .await?;
        if !candidates.is_empty() {
            candidates.sort_by(|a, b| {
                a.symbol
                    .len()
                    .cmp(&b.symbol.len())
                    .then_with(|| a.symbol.cmp(&b.symbol))
            });
            return Ok((candidates.into_iter().next(), false));
        }

        // Tier 3: fuzzy match over all distinct underlying symbols
        let symbols = self.repo.find_distinct_symbols(&UNDERLYING_TYPES).await?;
        let mut best: Option<(String, f64)> = None;
        for candidate in symbols {
            let score = similarity_ratio(symbol_text, &candidate);
            if best.as_ref().map_or(true, |(_, prev)| score > *prev) {
                best = Some((candidate, score));
            }
        }

        if let Some((symbol, score)) = best {
            if score >= self.fuzzy_score_threshold {
                debug!("Fuzzy corrected '{}' -> '{}' ({:.1})", symbol_text, symbol, score);
                let hits = self
                    .repo
                    .find_by_exact_symbol(&symbol, &UNDERLYING_TYPES)
                    .await?;
                if let Some(inst) = hits.into_iter().next() {
                    return Ok((Some(inst), true));
                }
            }
        }

        Ok((None, false))
    }
}
