use crate::error::GeoClusterError;
use crate::types::{LocationRecord, PolicyRecord, RawLocationRow, RawPolicyRow};
use crate::util::{is_blank, parse_f64_safe, parse_i64_safe};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Required column: canonical header and the accepted alternative.
type Column = (&'static str, &'static str);

const LOCATION_COLUMNS: [Column; 5] = [
    ("LocId", "Loc ID"),
    ("Country", "Pais"),
    ("City", "Ciudad"),
    ("Latitude", "Latitud"),
    ("Longitude", "Longitud"),
];

const POLICY_COLUMNS: [Column; 4] = [
    ("LocId", "Loc ID"),
    ("InsuredSum", "Suma Asegurada"),
    ("Premium", "Prima"),
    ("ClaimAmount", "Monto de siniestro"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    /// Blank financial cells read as zero.
    pub zero_filled_cells: usize,
}

/// Header whitespace is trimmed so the column check and the serde field
/// names see the same keys.
fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.flexible(true).trim(Trim::Headers);
    builder
}

pub fn load_locations(path: impl AsRef<Path>) -> crate::Result<(Vec<LocationRecord>, LoadReport)> {
    let rdr = reader_builder().from_path(path.as_ref())?;
    debug!(path = %path.as_ref().display(), "loading locations");
    read_locations_from(rdr)
}

pub fn load_policies(path: impl AsRef<Path>) -> crate::Result<(Vec<PolicyRecord>, LoadReport)> {
    let rdr = reader_builder().from_path(path.as_ref())?;
    debug!(path = %path.as_ref().display(), "loading policies");
    read_policies_from(rdr)
}

pub fn read_locations<R: Read>(input: R) -> crate::Result<(Vec<LocationRecord>, LoadReport)> {
    read_locations_from(reader_builder().from_reader(input))
}

pub fn read_policies<R: Read>(input: R) -> crate::Result<(Vec<PolicyRecord>, LoadReport)> {
    read_policies_from(reader_builder().from_reader(input))
}

fn read_locations_from<R: Read>(
    mut rdr: csv::Reader<R>,
) -> crate::Result<(Vec<LocationRecord>, LoadReport)> {
    const TABLE: &str = "location";
    require_columns(rdr.headers()?, TABLE, &LOCATION_COLUMNS)?;

    let mut out = Vec::new();
    let mut report = LoadReport::default();
    for (i, result) in rdr.deserialize::<RawLocationRow>().enumerate() {
        let row_no = i + 1;
        let row = result?;
        report.total_rows += 1;

        let loc_id = parse_id(row.loc_id.as_deref(), TABLE, row_no)?;
        let latitude = parse_coord(row.latitude.as_deref(), TABLE, row_no, "Latitude", 90.0)?;
        let longitude = parse_coord(row.longitude.as_deref(), TABLE, row_no, "Longitude", 180.0)?;
        let country = row.country.unwrap_or_default().trim().to_string();
        let city = row.city.unwrap_or_default().trim().to_string();

        out.push(LocationRecord {
            loc_id,
            country,
            city,
            latitude,
            longitude,
        });
    }
    Ok((out, report))
}

fn read_policies_from<R: Read>(
    mut rdr: csv::Reader<R>,
) -> crate::Result<(Vec<PolicyRecord>, LoadReport)> {
    const TABLE: &str = "policy";
    require_columns(rdr.headers()?, TABLE, &POLICY_COLUMNS)?;

    let mut out = Vec::new();
    let mut report = LoadReport::default();
    for (i, result) in rdr.deserialize::<RawPolicyRow>().enumerate() {
        let row_no = i + 1;
        let row = result?;
        report.total_rows += 1;

        let loc_id = parse_id(row.loc_id.as_deref(), TABLE, row_no)?;
        let mut amount = |raw: Option<&str>, column: &'static str| {
            if is_blank(raw) {
                report.zero_filled_cells += 1;
                return Ok(0.0);
            }
            parse_f64_safe(raw).ok_or_else(|| {
                GeoClusterError::malformed(TABLE, row_no, column, format!("'{}' is not numeric", raw.unwrap_or_default()))
            })
        };
        let insured_sum = amount(row.insured_sum.as_deref(), "InsuredSum")?;
        let premium = amount(row.premium.as_deref(), "Premium")?;
        let claim_amount = amount(row.claim_amount.as_deref(), "ClaimAmount")?;

        out.push(PolicyRecord {
            loc_id,
            insured_sum,
            premium,
            claim_amount,
        });
    }

    if report.zero_filled_cells > 0 {
        warn!(cells = report.zero_filled_cells, "blank policy amounts read as 0");
    }
    Ok((out, report))
}

fn require_columns(headers: &StringRecord, table: &'static str, required: &[Column]) -> crate::Result<()> {
    for (name, alias) in required {
        let present = headers.iter().any(|h| {
            let h = h.trim();
            h == *name || h == *alias
        });
        if !present {
            return Err(GeoClusterError::malformed(table, 0, *name, "required column is missing"));
        }
    }
    Ok(())
}

fn parse_id(raw: Option<&str>, table: &'static str, row: usize) -> crate::Result<i64> {
    parse_i64_safe(raw).ok_or_else(|| {
        GeoClusterError::malformed(
            table,
            row,
            "LocId",
            format!("'{}' is not an integer id", raw.unwrap_or_default()),
        )
    })
}

fn parse_coord(
    raw: Option<&str>,
    table: &'static str,
    row: usize,
    column: &'static str,
    limit: f64,
) -> crate::Result<f64> {
    match parse_f64_safe(raw) {
        Some(v) if (-limit..=limit).contains(&v) => Ok(v),
        Some(v) => Err(GeoClusterError::malformed(
            table,
            row,
            column,
            format!("{} is outside [-{}, {}]", v, limit, limit),
        )),
        None => Err(GeoClusterError::malformed(
            table,
            row,
            column,
            format!("'{}' is not numeric", raw.unwrap_or_default()),
        )),
    }
}
