//! Merging per-source results into one ranked result set.
//!
//! Totals are summed, records concatenated in source order, then stably
//! sorted by score descending so equal scores keep source order and, within
//! a source, the order the source returned them.

use std::cmp::Ordering;

use crate::types::{AggregateResult, Record, SourceResults};

/// Merges per-source outcomes. `None` marks a source that contributed
/// nothing.
///
/// The returned [`AggregateResult`] has an empty `sources` list; the
/// orchestrator fills it in.
pub fn aggregate<I>(outcomes: I) -> AggregateResult
where
    I: IntoIterator<Item = Option<SourceResults>>,
{
    let mut total: u64 = 0;
    let mut scored: Vec<(f64, Record)> = Vec::new();

    for source in outcomes.into_iter().flatten() {
        total = total.saturating_add(source.total);
        scored.extend(source.records.into_iter().map(|r| (r.score(), r)));
    }

    // `sort_by` is stable.
    scored.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    AggregateResult {
        total,
        results: scored.into_iter().map(|(_, record)| record).collect(),
        sources: Vec::new(),
    }
}
