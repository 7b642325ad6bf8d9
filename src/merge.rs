//! Left join of an aggregate table onto the clustered location table.
//!
//! Every location row survives the join exactly once, duplicates included.
//! Rows without a matching aggregate are filled with zeros in a separate
//! normalization pass.

use crate::cluster::Clustering;
use crate::error::GeoClusterError;
use crate::types::{EnrichedLocation, LocId, LocationRecord, Metrics};
use std::collections::HashMap;

/// A joined row before normalization; `metrics` is `None` when the
/// location has no policies.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow<'a> {
    pub location: &'a LocationRecord,
    pub cluster: usize,
    pub metrics: Option<Metrics>,
}

pub fn left_join<'a>(
    locations: &'a [LocationRecord],
    clustering: &Clustering,
    aggregates: &HashMap<LocId, Metrics>,
) -> Result<Vec<JoinedRow<'a>>, GeoClusterError> {
    if clustering.labels.len() != locations.len() {
        return Err(GeoClusterError::LengthMismatch {
            locations: locations.len(),
            labels: clustering.labels.len(),
        });
    }
    Ok(locations
        .iter()
        .zip(&clustering.labels)
        .map(|(location, &cluster)| JoinedRow {
            location,
            cluster,
            metrics: aggregates.get(&location.loc_id).copied(),
        })
        .collect())
}

/// Replace missing aggregates with zeros.
pub fn fill_missing_with_zero(rows: Vec<JoinedRow<'_>>) -> Vec<EnrichedLocation> {
    rows.into_iter()
        .map(|row| {
            let m = row.metrics.unwrap_or_default();
            EnrichedLocation {
                loc_id: row.location.loc_id,
                country: row.location.country.clone(),
                city: row.location.city.clone(),
                latitude: row.location.latitude,
                longitude: row.location.longitude,
                cluster: row.cluster,
                insured_sum: m.insured_sum,
                premium: m.premium,
                claim_amount: m.claim_amount,
            }
        })
        .collect()
}

/// Join then normalize.
pub fn enrich(
    locations: &[LocationRecord],
    clustering: &Clustering,
    aggregates: &HashMap<LocId, Metrics>,
) -> Result<Vec<EnrichedLocation>, GeoClusterError> {
    let joined = left_join(locations, clustering, aggregates)?;
    Ok(fill_missing_with_zero(joined))
}
