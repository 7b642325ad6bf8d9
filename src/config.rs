//! Command-line options for the batch report binary.

use crate::cluster::{ClusterOptions, LabelOrder};
use crate::error::GeoClusterError;
use crate::geo::DEFAULT_THRESHOLD_KM;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LabelOrderArg {
    /// Number clusters by their first input row
    Discovery,
    /// Number clusters by the smallest location id they contain
    MinLocId,
}

impl From<LabelOrderArg> for LabelOrder {
    fn from(arg: LabelOrderArg) -> Self {
        match arg {
            LabelOrderArg::Discovery => LabelOrder::Discovery,
            LabelOrderArg::MinLocId => LabelOrder::MinLocId,
        }
    }
}

/// Cluster insured locations by distance and attach per-location policy totals
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Location table (LocId, Country, City, Latitude, Longitude)
    #[arg(short, long)]
    pub locations: PathBuf,

    /// Policy table (LocId, InsuredSum, Premium, ClaimAmount)
    #[arg(short, long)]
    pub policies: PathBuf,

    /// Directory for the CSV and JSON outputs
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Maximum distance in kilometres linking two locations
    #[arg(long, default_value_t = DEFAULT_THRESHOLD_KM)]
    pub threshold_km: f64,

    /// How cluster labels are numbered
    #[arg(long, value_enum, default_value_t = LabelOrderArg::Discovery)]
    pub label_order: LabelOrderArg,

    /// Rows shown in each console preview
    #[arg(long, default_value_t = 5)]
    pub preview_rows: usize,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn cluster_options(&self) -> Result<ClusterOptions, GeoClusterError> {
        ClusterOptions::new(self.threshold_km, self.label_order.into())
    }

    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
