use crate::types::{AggregateKind, LocId, Metrics, PolicyRecord};
use std::collections::HashMap;
use tracing::debug;

/// Per-location totals and averages of the policy financial fields.
///
/// Sums and means are kept as separate tables because each is merged onto
/// the location table on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregates {
    pub sums: HashMap<LocId, Metrics>,
    pub means: HashMap<LocId, Metrics>,
    pub counts: HashMap<LocId, usize>,
}

impl Aggregates {
    pub fn table(&self, kind: AggregateKind) -> &HashMap<LocId, Metrics> {
        match kind {
            AggregateKind::Sum => &self.sums,
            AggregateKind::Mean => &self.means,
        }
    }

    /// Number of distinct `LocId`s seen in the policy table.
    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }
}

pub fn aggregate_policies(policies: &[PolicyRecord]) -> Aggregates {
    #[derive(Default)]
    struct Acc {
        total: Metrics,
        count: usize,
    }

    let mut map: HashMap<LocId, Acc> = HashMap::new();
    for p in policies {
        let e = map.entry(p.loc_id).or_default();
        e.total.accumulate(p.metrics());
        e.count += 1;
    }

    let mut out = Aggregates::default();
    for (loc_id, acc) in map {
        out.means.insert(loc_id, acc.total.divided_by(acc.count));
        out.sums.insert(loc_id, acc.total);
        out.counts.insert(loc_id, acc.count);
    }
    debug!(policies = policies.len(), locations = out.len(), "aggregated policies");
    out
}
