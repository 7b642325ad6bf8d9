use crate::aggregate::{aggregate_policies, Aggregates};
use crate::cluster::{assign_clusters, ClusterOptions, Clustering};
use crate::error::GeoClusterError;
use crate::merge::enrich;
use crate::types::{AggregateKind, EnrichedLocation, LocationRecord, PolicyRecord};
use std::collections::HashSet;
use tracing::info;

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub clustering: Clustering,
    pub aggregates: Aggregates,
    /// Locations merged with per-`LocId` totals.
    pub sum_enriched: Vec<EnrichedLocation>,
    /// Locations merged with per-`LocId` averages.
    pub mean_enriched: Vec<EnrichedLocation>,
    /// Location rows whose `LocId` has no policy.
    pub unmatched_locations: usize,
}

impl PipelineOutput {
    pub fn enriched(&self, kind: AggregateKind) -> &[EnrichedLocation] {
        match kind {
            AggregateKind::Sum => &self.sum_enriched,
            AggregateKind::Mean => &self.mean_enriched,
        }
    }
}

/// Cluster the locations, aggregate the policies and merge both aggregate
/// tables onto the clustered locations.
pub fn run(
    locations: &[LocationRecord],
    policies: &[PolicyRecord],
    options: &ClusterOptions,
) -> Result<PipelineOutput, GeoClusterError> {
    validate_locations(locations)?;
    validate_policies(policies)?;

    let clustering = assign_clusters(locations, options);
    let aggregates = aggregate_policies(policies);

    let sum_enriched = enrich(locations, &clustering, aggregates.table(AggregateKind::Sum))?;
    let mean_enriched = enrich(locations, &clustering, aggregates.table(AggregateKind::Mean))?;

    let matched: HashSet<_> = aggregates.sums.keys().copied().collect();
    let unmatched_locations = locations
        .iter()
        .filter(|l| !matched.contains(&l.loc_id))
        .count();

    info!(
        locations = locations.len(),
        policies = policies.len(),
        clusters = clustering.cluster_count,
        unmatched = unmatched_locations,
        "pipeline finished"
    );

    Ok(PipelineOutput {
        clustering,
        aggregates,
        sum_enriched,
        mean_enriched,
        unmatched_locations,
    })
}

fn validate_locations(locations: &[LocationRecord]) -> Result<(), GeoClusterError> {
    for (i, loc) in locations.iter().enumerate() {
        let row = i + 1;
        if !loc.latitude.is_finite() || !(-90.0..=90.0).contains(&loc.latitude) {
            return Err(GeoClusterError::malformed(
                "location",
                row,
                "Latitude",
                format!("{} is not a latitude in degrees", loc.latitude),
            ));
        }
        if !loc.longitude.is_finite() || !(-180.0..=180.0).contains(&loc.longitude) {
            return Err(GeoClusterError::malformed(
                "location",
                row,
                "Longitude",
                format!("{} is not a longitude in degrees", loc.longitude),
            ));
        }
    }
    Ok(())
}

fn validate_policies(policies: &[PolicyRecord]) -> Result<(), GeoClusterError> {
    for (i, p) in policies.iter().enumerate() {
        let fields = [
            ("InsuredSum", p.insured_sum),
            ("Premium", p.premium),
            ("ClaimAmount", p.claim_amount),
        ];
        if let Some((column, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(GeoClusterError::malformed(
                "policy",
                i + 1,
                *column,
                format!("{} is not a finite amount", value),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_are_not_errors() {
        let out = run(&[], &[], &ClusterOptions::default()).unwrap();
        assert!(out.clustering.is_empty());
        assert!(out.sum_enriched.is_empty());
        assert!(out.mean_enriched.is_empty());
        assert_eq!(out.unmatched_locations, 0);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let locations = vec![
            LocationRecord::new(1, "MX", "CDMX", 19.4, -99.1),
            LocationRecord::new(2, "MX", "Nowhere", 95.0, 0.0),
        ];
        let err = run(&locations, &[], &ClusterOptions::default()).unwrap_err();
        match err {
            GeoClusterError::MalformedInput { row, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "Latitude");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn rejects_non_finite_amounts() {
        let locations = vec![LocationRecord::new(1, "MX", "CDMX", 19.4, -99.1)];
        let policies = vec![PolicyRecord::new(1, 10.0, f64::NAN, 0.0)];
        let err = run(&locations, &policies, &ClusterOptions::default()).unwrap_err();
        assert!(matches!(err, GeoClusterError::MalformedInput { ref column, .. } if column == "Premium"));
    }

    #[test]
    fn counts_unmatched_rows() {
        let locations = vec![
            LocationRecord::new(1, "MX", "CDMX", 19.4, -99.1),
            LocationRecord::new(99, "MX", "Puebla", 19.0, -98.2),
            LocationRecord::new(99, "MX", "Puebla", 19.0, -98.2),
        ];
        let policies = vec![PolicyRecord::new(1, 10.0, 1.0, 0.0)];
        let out = run(&locations, &policies, &ClusterOptions::default()).unwrap();
        assert_eq!(out.unmatched_locations, 2);
        assert_eq!(out.enriched(AggregateKind::Mean).len(), 3);
    }
}
