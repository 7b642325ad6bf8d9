use crate::util::format_number;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Location identifier shared by the location and policy tables.
pub type LocId = i64;

#[derive(Debug, Deserialize)]
pub struct RawLocationRow {
    #[serde(rename = "LocId", alias = "Loc ID")]
    pub loc_id: Option<String>,
    #[serde(rename = "Country", alias = "Pais")]
    pub country: Option<String>,
    #[serde(rename = "City", alias = "Ciudad")]
    pub city: Option<String>,
    #[serde(rename = "Latitude", alias = "Latitud")]
    pub latitude: Option<String>,
    #[serde(rename = "Longitude", alias = "Longitud")]
    pub longitude: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawPolicyRow {
    #[serde(rename = "LocId", alias = "Loc ID")]
    pub loc_id: Option<String>,
    #[serde(rename = "InsuredSum", alias = "Suma Asegurada")]
    pub insured_sum: Option<String>,
    #[serde(rename = "Premium", alias = "Prima")]
    pub premium: Option<String>,
    #[serde(rename = "ClaimAmount", alias = "Monto de siniestro")]
    pub claim_amount: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub loc_id: LocId,
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationRecord {
    pub fn new(
        loc_id: LocId,
        country: impl Into<String>,
        city: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            loc_id,
            country: country.into(),
            city: city.into(),
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyRecord {
    pub loc_id: LocId,
    pub insured_sum: f64,
    pub premium: f64,
    pub claim_amount: f64,
}

impl PolicyRecord {
    pub fn new(loc_id: LocId, insured_sum: f64, premium: f64, claim_amount: f64) -> Self {
        Self {
            loc_id,
            insured_sum,
            premium,
            claim_amount,
        }
    }

    pub fn metrics(&self) -> Metrics {
        Metrics::new(self.insured_sum, self.premium, self.claim_amount)
    }
}

/// The three financial fields carried through aggregation and merge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    pub insured_sum: f64,
    pub premium: f64,
    pub claim_amount: f64,
}

impl Metrics {
    pub fn new(insured_sum: f64, premium: f64, claim_amount: f64) -> Self {
        Self {
            insured_sum,
            premium,
            claim_amount,
        }
    }

    pub fn accumulate(&mut self, other: Metrics) {
        self.insured_sum += other.insured_sum;
        self.premium += other.premium;
        self.claim_amount += other.claim_amount;
    }

    pub fn divided_by(self, n: usize) -> Metrics {
        if n == 0 {
            return Metrics::default();
        }
        let n = n as f64;
        Metrics::new(self.insured_sum / n, self.premium / n, self.claim_amount / n)
    }
}

/// Which aggregate table an enriched location was merged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Sum,
    Mean,
}

impl AggregateKind {
    pub fn label(&self) -> &'static str {
        match self {
            AggregateKind::Sum => "sum",
            AggregateKind::Mean => "mean",
        }
    }
}

fn display_amount(v: &f64) -> String {
    format_number(*v, 2)
}

fn display_coord(v: &f64) -> String {
    format!("{:.4}", v)
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct EnrichedLocation {
    #[serde(rename = "LocId")]
    #[tabled(rename = "LocId")]
    pub loc_id: LocId,
    #[serde(rename = "Country")]
    #[tabled(rename = "Country")]
    pub country: String,
    #[serde(rename = "City")]
    #[tabled(rename = "City")]
    pub city: String,
    #[serde(rename = "Latitude")]
    #[tabled(rename = "Latitude", display_with = "display_coord")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    #[tabled(rename = "Longitude", display_with = "display_coord")]
    pub longitude: f64,
    #[serde(rename = "Cluster")]
    #[tabled(rename = "Cluster")]
    pub cluster: usize,
    #[serde(rename = "InsuredSum")]
    #[tabled(rename = "InsuredSum", display_with = "display_amount")]
    pub insured_sum: f64,
    #[serde(rename = "Premium")]
    #[tabled(rename = "Premium", display_with = "display_amount")]
    pub premium: f64,
    #[serde(rename = "ClaimAmount")]
    #[tabled(rename = "ClaimAmount", display_with = "display_amount")]
    pub claim_amount: f64,
}

impl EnrichedLocation {
    pub fn metrics(&self) -> Metrics {
        Metrics::new(self.insured_sum, self.premium, self.claim_amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ClusterSummaryRow {
    #[serde(rename = "Cluster")]
    #[tabled(rename = "Cluster")]
    pub cluster: usize,
    #[serde(rename = "Locations")]
    #[tabled(rename = "Locations")]
    pub locations: usize,
    #[serde(rename = "Countries")]
    #[tabled(rename = "Countries")]
    pub countries: String,
    #[serde(rename = "InsuredSum")]
    #[tabled(rename = "InsuredSum", display_with = "display_amount")]
    pub insured_sum: f64,
    #[serde(rename = "Premium")]
    #[tabled(rename = "Premium", display_with = "display_amount")]
    pub premium: f64,
    #[serde(rename = "ClaimAmount")]
    #[tabled(rename = "ClaimAmount", display_with = "display_amount")]
    pub claim_amount: f64,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub threshold_km: f64,
    pub total_locations: usize,
    pub total_policies: usize,
    pub total_clusters: usize,
    pub largest_cluster: usize,
    pub locations_without_policies: usize,
    pub total_insured_sum: f64,
    pub total_premium: f64,
    pub total_claim_amount: f64,
}
