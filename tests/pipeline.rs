//! End-to-end tests for the clustering and aggregation pipeline.

use geo_cluster_report::geo::haversine_km;
use geo_cluster_report::loader::{load_locations, load_policies};
use geo_cluster_report::output::write_csv;
use geo_cluster_report::reports::summarize_clusters;
use geo_cluster_report::{run, AggregateKind, ClusterOptions, LabelOrder, LocationRecord, Metrics, PolicyRecord};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use tempfile::NamedTempFile;

const TOL: f64 = 1e-9;

fn assert_metrics(actual: Metrics, expected: Metrics) {
    assert!(
        (actual.insured_sum - expected.insured_sum).abs() < TOL
            && (actual.premium - expected.premium).abs() < TOL
            && (actual.claim_amount - expected.claim_amount).abs() < TOL,
        "{:?} != {:?}",
        actual,
        expected
    );
}

fn sample_locations() -> Vec<LocationRecord> {
    vec![
        LocationRecord::new(1, "Ghana", "Gulf A", 0.0, 0.0),
        LocationRecord::new(2, "Ghana", "Gulf B", 1.0, 0.0),
        LocationRecord::new(3, "Spain", "Inland", 40.0, 0.0),
        LocationRecord::new(99, "Spain", "Uninsured", 40.5, 0.5),
    ]
}

fn sample_policies() -> Vec<PolicyRecord> {
    vec![
        PolicyRecord::new(1, 100.0, 10.0, 5.0),
        PolicyRecord::new(1, 200.0, 20.0, 0.0),
        PolicyRecord::new(2, 40.0, 4.0, 4.0),
        PolicyRecord::new(3, 10.0, 1.0, 0.0),
    ]
}

#[test]
fn test_example_scenario() {
    let locations = sample_locations();
    let out = run(&locations, &sample_policies(), &ClusterOptions::default()).unwrap();

    let labels = &out.clustering.labels;
    assert_eq!(labels[0], labels[1]);
    assert_ne!(labels[0], labels[2]);
    assert_eq!(labels[2], labels[3]);
    assert_eq!(out.clustering.cluster_count, 2);

    assert_metrics(out.sum_enriched[0].metrics(), Metrics::new(300.0, 30.0, 5.0));
    assert_metrics(out.mean_enriched[0].metrics(), Metrics::new(150.0, 15.0, 2.5));
    assert_metrics(out.sum_enriched[1].metrics(), out.mean_enriched[1].metrics());
}

#[test]
fn test_join_completeness_and_zero_default() {
    let locations = sample_locations();
    let out = run(&locations, &sample_policies(), &ClusterOptions::default()).unwrap();

    for kind in [AggregateKind::Sum, AggregateKind::Mean] {
        let rows = out.enriched(kind);
        assert_eq!(rows.len(), locations.len());
        let uninsured = rows.iter().find(|r| r.loc_id == 99).unwrap();
        assert_eq!(uninsured.metrics(), Metrics::default());
        for (row, loc) in rows.iter().zip(&locations) {
            assert_eq!(row.loc_id, loc.loc_id);
            assert_eq!(row.city, loc.city);
        }
    }
    assert_eq!(out.unmatched_locations, 1);
}

#[test]
fn test_aggregation_correctness() {
    let policies: Vec<PolicyRecord> = (0..40)
        .map(|i| PolicyRecord::new(i % 4, i as f64 * 3.5, i as f64, (i % 3) as f64))
        .collect();
    let locations: Vec<LocationRecord> = (0..4)
        .map(|id| LocationRecord::new(id, "", "", id as f64 * 20.0, 0.0))
        .collect();
    let out = run(&locations, &policies, &ClusterOptions::default()).unwrap();

    for loc in &locations {
        let mine: Vec<&PolicyRecord> = policies.iter().filter(|p| p.loc_id == loc.loc_id).collect();
        let mut expected = Metrics::default();
        for p in &mine {
            expected.accumulate(p.metrics());
        }
        let row = loc.loc_id as usize;
        assert_metrics(out.sum_enriched[row].metrics(), expected);
        assert_metrics(out.mean_enriched[row].metrics(), expected.divided_by(mine.len()));
    }
}

#[test]
fn test_partition_validity() {
    let locations = vec![
        LocationRecord::new(1, "MX", "CDMX", 19.43, -99.13),
        LocationRecord::new(2, "MX", "Puebla", 19.04, -98.20),
        LocationRecord::new(3, "GT", "Guatemala", 14.63, -90.51),
        LocationRecord::new(4, "CO", "Bogota", 4.71, -74.07),
        LocationRecord::new(5, "PE", "Lima", -12.05, -77.04),
        LocationRecord::new(6, "CL", "Santiago", -33.45, -70.66),
        LocationRecord::new(7, "AR", "Mendoza", -32.89, -68.83),
        LocationRecord::new(8, "ES", "Madrid", 40.42, -3.70),
    ];
    let out = run(&locations, &[], &ClusterOptions::default()).unwrap();
    let clustering = &out.clustering;

    // Every point lands in exactly one cluster.
    let members = clustering.members();
    let all: usize = members.iter().map(|m| m.len()).sum();
    assert_eq!(all, locations.len());
    assert!(clustering.cluster_count <= locations.len());

    // CDMX-Guatemala is over the threshold but chains through Puebla.
    assert!(haversine_km(19.43, -99.13, 14.63, -90.51) > 1000.0);
    assert_eq!(clustering.labels[0], clustering.labels[2]);

    // Each cluster is connected under the threshold.
    for group in &members {
        let mut reached: HashSet<usize> = HashSet::new();
        let mut stack = vec![group[0]];
        while let Some(i) = stack.pop() {
            if !reached.insert(i) {
                continue;
            }
            for &j in group {
                let (a, b) = (&locations[i], &locations[j]);
                if haversine_km(a.latitude, a.longitude, b.latitude, b.longitude) <= 1000.0 {
                    stack.push(j);
                }
            }
        }
        assert_eq!(reached.len(), group.len());
    }

    // Points in different clusters are never within the threshold.
    for i in 0..locations.len() {
        for j in (i + 1)..locations.len() {
            if clustering.labels[i] != clustering.labels[j] {
                let (a, b) = (&locations[i], &locations[j]);
                assert!(haversine_km(a.latitude, a.longitude, b.latitude, b.longitude) > 1000.0);
            }
        }
    }

    // Madrid is isolated.
    assert_eq!(clustering.sizes()[clustering.labels[7]], 1);
}

#[test]
fn test_min_loc_id_labels_stable_under_shuffle() {
    let options = ClusterOptions::new(1000.0, LabelOrder::MinLocId).unwrap();
    let locations = sample_locations();
    let mut shuffled = locations.clone();
    shuffled.rotate_left(3);

    let a = run(&locations, &[], &options).unwrap();
    let b = run(&shuffled, &[], &options).unwrap();
    let by_id = |rows: &[geo_cluster_report::EnrichedLocation]| -> HashMap<i64, usize> {
        rows.iter().map(|r| (r.loc_id, r.cluster)).collect()
    };
    assert_eq!(by_id(&a.sum_enriched), by_id(&b.sum_enriched));
}

#[test]
fn test_csv_files_end_to_end() {
    let mut loc_file = NamedTempFile::new().unwrap();
    writeln!(loc_file, "Loc ID,Latitud,Longitud,Pais,Ciudad").unwrap();
    writeln!(loc_file, "1,19.43,-99.13,Mexico,CDMX").unwrap();
    writeln!(loc_file, "2,19.04,-98.20,Mexico,Puebla").unwrap();
    writeln!(loc_file, "3,-33.45,-70.66,Chile,Santiago").unwrap();
    writeln!(loc_file, "99,-32.89,-68.83,Argentina,Mendoza").unwrap();

    let mut pol_file = NamedTempFile::new().unwrap();
    writeln!(pol_file, "Poliza,Loc ID,Suma Asegurada,Prima,Monto de siniestro").unwrap();
    writeln!(pol_file, "A1,1,\"1,000\",100,50").unwrap();
    writeln!(pol_file, "A2,1,3000,300,").unwrap();
    writeln!(pol_file, "B1,3,500,20,0").unwrap();

    let (locations, loc_report) = load_locations(loc_file.path()).unwrap();
    let (policies, pol_report) = load_policies(pol_file.path()).unwrap();
    assert_eq!(loc_report.total_rows, 4);
    assert_eq!(pol_report.total_rows, 3);
    assert_eq!(pol_report.zero_filled_cells, 1);

    let out = run(&locations, &policies, &ClusterOptions::default()).unwrap();
    assert_eq!(out.clustering.labels, vec![0, 0, 1, 1]);
    assert_metrics(out.sum_enriched[0].metrics(), Metrics::new(4000.0, 400.0, 50.0));
    assert_metrics(out.mean_enriched[0].metrics(), Metrics::new(2000.0, 200.0, 25.0));
    assert_eq!(out.mean_enriched[3].metrics(), Metrics::default());

    let summary = summarize_clusters(&out.sum_enriched, out.clustering.cluster_count);
    assert_eq!(summary[1].countries, "Argentina, Chile");
    assert_eq!(summary[1].insured_sum, 500.0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clusters_sum.csv");
    write_csv(&path, &out.sum_enriched).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 5);
    assert!(text.lines().nth(4).unwrap().starts_with("99,Argentina,Mendoza,"));
}
