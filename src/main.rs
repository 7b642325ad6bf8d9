// Entry point and high-level CLI flow.
//
// One batch run: load both tables, cluster and aggregate, then write the
// enriched tables plus summaries to the output directory and print short
// markdown previews of each.
use anyhow::Context;
use clap::Parser;
use geo_cluster_report::config::Args;
use geo_cluster_report::types::{LocationRecord, PolicyRecord};
use geo_cluster_report::{loader, output, pipeline, reports, util, AggregateKind, ClusterOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Load both input tables and print a short diagnostic line for each.
fn handle_load(args: &Args) -> anyhow::Result<(Vec<LocationRecord>, Vec<PolicyRecord>)> {
    let (locations, loc_report) = loader::load_locations(&args.locations)
        .with_context(|| format!("failed to load locations from {}", args.locations.display()))?;
    let (policies, pol_report) = loader::load_policies(&args.policies)
        .with_context(|| format!("failed to load policies from {}", args.policies.display()))?;

    println!(
        "Processing dataset... ({} locations, {} policies loaded)",
        util::format_int(loc_report.total_rows),
        util::format_int(pol_report.total_rows)
    );
    if pol_report.zero_filled_cells > 0 {
        println!(
            "Note: {} blank policy amounts were read as 0.",
            util::format_int(pol_report.zero_filled_cells)
        );
    }
    println!();
    Ok((locations, policies))
}

/// Run the pipeline, write every output file and print previews.
fn handle_generate_reports(
    args: &Args,
    options: &ClusterOptions,
    locations: &[LocationRecord],
    policies: &[PolicyRecord],
) -> anyhow::Result<()> {
    let out = pipeline::run(locations, policies, options)?;

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("cannot create {}", args.output_dir.display()))?;

    for kind in [AggregateKind::Sum, AggregateKind::Mean] {
        let file = args.output_dir.join(format!("clusters_{}.csv", kind.label()));
        output::write_csv(&file, out.enriched(kind))
            .with_context(|| format!("write error: {}", file.display()))?;
        let title = match kind {
            AggregateKind::Sum => "Locations with Policy Totals",
            AggregateKind::Mean => "Locations with Policy Averages",
        };
        output::preview_table(
            title,
            Some(format!("Full table exported to {}", file.display()).as_str()),
            out.enriched(kind),
            args.preview_rows,
        );
    }

    let cluster_rows = reports::summarize_clusters(&out.sum_enriched, out.clustering.cluster_count);
    let file = args.output_dir.join("cluster_summary.csv");
    output::write_csv(&file, &cluster_rows).with_context(|| format!("write error: {}", file.display()))?;
    output::preview_table(
        "Cluster Summary",
        Some(
            format!(
                "{} clusters within {} km, exported to {}",
                out.clustering.cluster_count,
                util::format_number(options.threshold_km, 0),
                file.display()
            )
            .as_str(),
        ),
        &cluster_rows,
        args.preview_rows,
    );

    let summary = reports::generate_summary(&out, policies.len(), options);
    let file = args.output_dir.join("summary.json");
    output::write_json(&file, &summary).with_context(|| format!("write error: {}", file.display()))?;
    println!("Summary Stats ({}):", file.display());
    println!(
        "{{\"total_clusters\": {}, \"total_insured_sum\": {}}}\n",
        util::format_int(summary.total_clusters),
        util::format_number(summary.total_insured_sum, 2)
    );
    info!(output_dir = %args.output_dir.display(), "reports written");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let options = args.cluster_options()?;
    let (locations, policies) = handle_load(&args)?;
    handle_generate_reports(&args, &options, &locations, &policies)
}
