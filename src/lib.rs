//! Distance-based clustering of insured locations and per-location policy
//! aggregation.
//!
//! Locations within a great-circle distance of each other, directly or
//! through a chain of intermediate locations, share a cluster label. Policy
//! amounts are summed and averaged per location and left-joined onto the
//! clustered location table, producing one sum-enriched and one
//! mean-enriched table.

pub mod aggregate;
pub mod cluster;
pub mod config;
pub mod error;
pub mod geo;
pub mod loader;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod types;
pub mod util;

pub use aggregate::{aggregate_policies, Aggregates};
pub use cluster::{assign_clusters, ClusterOptions, Clustering, LabelOrder};
pub use error::GeoClusterError;
pub use pipeline::{run, PipelineOutput};
pub use types::{AggregateKind, EnrichedLocation, LocId, LocationRecord, Metrics, PolicyRecord};

pub type Result<T> = std::result::Result<T, GeoClusterError>;
