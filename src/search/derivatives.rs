/// Derivative discovery for a resolved underlying
use crate::error::Result;
use crate::store::{InstrumentFilter, InstrumentRepository};
use crate::types::{Instrument, FUTURE_TYPES};
use crate::utils::parse_expiry_date;

/// Fetch the nearest-expiry futures written against an underlying.
/// Contracts with missing or unparseable expiries sort last.
pub async fn nearest_futures(
    repo: &dyn InstrumentRepository,
    underlying_id: i64,
    limit: usize,
) -> Result<Vec<Instrument>> {
    let filter = InstrumentFilter::new()
        .with_underlying(underlying_id)
        .with_types(&FUTURE_TYPES);

    let mut futures = repo.find_by_filters(&filter, usize::MAX).await?;
    futures.sort_by_key(|inst| parse_expiry_date(inst.expiry_date.as_deref()));
    futures.truncate(limit);
    Ok(futures)
}
