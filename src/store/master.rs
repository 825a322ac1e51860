/// Transformation of the raw symbol master into store rows.
///
/// The raw file is a JSON array of positional rows; cash instruments and
/// derivatives use different layouts. Only instrument types 1-6 are kept
/// (mutual funds, bonds and the rest are dropped).
use serde_json::Value;

use crate::error::{Result, SearchError};
use crate::types::Instrument;

/// Raw column positions shared by both row layouts
const COL_TYPE: usize = 0;
const COL_SYMBOL: usize = 1;
const COL_ID: usize = 2;

pub struct MasterReport {
    pub instruments: Vec<Instrument>,
    pub skipped: usize,
}

fn col_i32(row: &[Value], idx: usize) -> Option<i32> {
    row.get(idx).and_then(Value::as_i64).map(|v| v as i32)
}

fn col_i64(row: &[Value], idx: usize) -> Option<i64> {
    row.get(idx).and_then(Value::as_i64)
}

fn col_f64(row: &[Value], idx: usize) -> Option<f64> {
    row.get(idx).and_then(Value::as_f64)
}

fn col_str(row: &[Value], idx: usize) -> Option<String> {
    row.get(idx)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

fn cash_row(row: &[Value], instrument_type: i32, symbol: String, id: i64) -> Instrument {
    Instrument {
        instrument_id: id,
        instrument_type,
        symbol,
        display_symbol: col_str(row, 3),
        exchange: col_i32(row, 5),
        segment: col_i32(row, 11),
        trading_symbol: col_str(row, 12),
        isin: col_str(row, 14),
        underlying_instrument_id: None,
        expiry_date: None,
        expiry_type: None,
        option_type: None,
        strike_price: None,
    }
}

fn derivative_row(row: &[Value], instrument_type: i32, symbol: String, id: i64) -> Instrument {
    Instrument {
        instrument_id: id,
        instrument_type,
        symbol: symbol.clone(),
        display_symbol: col_str(row, 4),
        // Not provided in the F&O layout
        exchange: None,
        segment: col_i32(row, 13),
        trading_symbol: Some(symbol),
        isin: None,
        underlying_instrument_id: col_i64(row, 3),
        expiry_date: col_str(row, 5),
        expiry_type: col_i32(row, 6),
        option_type: col_i32(row, 9),
        strike_price: col_f64(row, 10),
    }
}

/// Transform raw master rows into store rows, dropping irrelevant types
pub fn transform_master(rows: &[Value]) -> Result<MasterReport> {
    let mut instruments = Vec::new();
    let mut skipped = 0usize;

    for (idx, value) in rows.iter().enumerate() {
        let row = value
            .as_array()
            .ok_or_else(|| SearchError::MalformedMasterRow(format!("row {} is not an array", idx)))?;

        let Some(instrument_type) = col_i32(row, COL_TYPE) else {
            return Err(SearchError::MalformedMasterRow(format!(
                "row {} has no instrument type",
                idx
            )));
        };

        if !(1..=6).contains(&instrument_type) {
            skipped += 1;
            continue;
        }

        let symbol = col_str(row, COL_SYMBOL).ok_or_else(|| {
            SearchError::MalformedMasterRow(format!("row {} has no symbol", idx))
        })?;
        let id = col_i64(row, COL_ID).ok_or_else(|| {
            SearchError::MalformedMasterRow(format!("row {} has no instrument id", idx))
        })?;

        let instrument = if matches!(instrument_type, 1 | 2) {
            cash_row(row, instrument_type, symbol, id)
        } else {
            derivative_row(row, instrument_type, symbol, id)
        };
        instruments.push(instrument);
    }

    Ok(MasterReport {
        instruments,
        skipped,
    })
}
