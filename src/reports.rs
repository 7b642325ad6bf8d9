use crate::cluster::ClusterOptions;
use crate::pipeline::PipelineOutput;
use crate::types::{ClusterSummaryRow, EnrichedLocation, Metrics, RunSummary};
use chrono::Utc;
use std::collections::BTreeSet;

/// One row per cluster label with its location count, the countries it
/// spans and the summed financial fields of its locations.
///
/// Pass the sum-enriched table to get cluster totals.
pub fn summarize_clusters(rows: &[EnrichedLocation], cluster_count: usize) -> Vec<ClusterSummaryRow> {
    #[derive(Default)]
    struct Acc {
        locations: usize,
        countries: BTreeSet<String>,
        totals: Metrics,
    }

    let mut accs: Vec<Acc> = (0..cluster_count).map(|_| Acc::default()).collect();
    for r in rows {
        if r.cluster >= accs.len() {
            accs.resize_with(r.cluster + 1, Acc::default);
        }
        let e = &mut accs[r.cluster];
        e.locations += 1;
        if !r.country.trim().is_empty() {
            e.countries.insert(r.country.trim().to_string());
        }
        e.totals.accumulate(r.metrics());
    }

    accs.into_iter()
        .enumerate()
        .map(|(cluster, acc)| ClusterSummaryRow {
            cluster,
            locations: acc.locations,
            countries: acc.countries.into_iter().collect::<Vec<_>>().join(", "),
            insured_sum: acc.totals.insured_sum,
            premium: acc.totals.premium,
            claim_amount: acc.totals.claim_amount,
        })
        .collect()
}

pub fn generate_summary(
    output: &PipelineOutput,
    total_policies: usize,
    options: &ClusterOptions,
) -> RunSummary {
    let mut totals = Metrics::default();
    for r in &output.sum_enriched {
        totals.accumulate(r.metrics());
    }
    RunSummary {
        generated_at: Utc::now(),
        threshold_km: options.threshold_km,
        total_locations: output.sum_enriched.len(),
        total_policies,
        total_clusters: output.clustering.cluster_count,
        largest_cluster: output.clustering.sizes().into_iter().max().unwrap_or(0),
        locations_without_policies: output.unmatched_locations,
        total_insured_sum: totals.insured_sum,
        total_premium: totals.premium,
        total_claim_amount: totals.claim_amount,
    }
}
