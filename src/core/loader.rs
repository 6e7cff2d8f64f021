//! CSV loading into a [`Dataset`]
//!
//! Two hole layouts are read:
//!
//! - **flat**: one row per hole (`object_id`, `length`, `radius`, optional
//!   `hole_id` and `units`), optionally paired with an objects CSV that
//!   declares every object including those without holes
//! - **nested**: one row per object with a `holes` column holding a JSON
//!   list of `{"length": .., "radius": ..}` entries
//!
//! Header names are matched case-insensitively. Columns the loader does not
//! interpret are kept as passthrough columns and written back unchanged.
//! Row-level problems are collected over the whole file and reported
//! together.

use csv::{ReaderBuilder, StringRecord};
use miette::Diagnostic;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

use crate::analysis::model::{Dataset, HoleRecord, ObjectRecord};
use crate::core::error::{DataQualityError, DataQualityIssue, IssueKind};
use crate::core::units::Unit;

const OBJECT_ID_COLUMNS: &[&str] = &["object_id", "object", "uuid"];
const HOLE_ID_COLUMNS: &[&str] = &["hole_id", "id"];
const LENGTH_COLUMN: &str = "length";
const RADIUS_COLUMN: &str = "radius";
const UNITS_COLUMN: &str = "units";
const HOLES_COLUMN: &str = "holes";

/// Layout of the holes input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Flat,
    Nested,
}

/// Errors raised while reading input tables
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    #[diagnostic(code(hreach::load::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    #[diagnostic(code(hreach::load::csv))]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: missing required column '{column}'")]
    #[diagnostic(
        code(hreach::load::missing_column),
        help("run 'hreach template' to see the expected columns")
    )]
    MissingColumn { path: String, column: &'static str },

    #[error(transparent)]
    #[diagnostic(transparent)]
    DataQuality(#[from] DataQualityError),
}

/// Header lookup with case-insensitive names and passthrough tracking
struct Columns {
    names: Vec<String>,
    map: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
        let mut map = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            map.entry(name.to_lowercase()).or_insert(i);
        }
        Self { names, map }
    }

    /// Index of the first present column among `aliases`
    fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|a| self.map.get(*a).copied())
    }

    fn require(&self, aliases: &[&'static str], path: &str) -> Result<usize, LoadError> {
        self.find(aliases).ok_or_else(|| LoadError::MissingColumn {
            path: path.to_string(),
            column: aliases[0],
        })
    }

    /// Indices of every column not in `used`
    fn passthrough(&self, used: &[Option<usize>]) -> Vec<usize> {
        (0..self.names.len())
            .filter(|i| !used.contains(&Some(*i)))
            .collect()
    }
}

fn field(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn extras(record: &StringRecord, columns: &[usize]) -> Vec<String> {
    columns
        .iter()
        .map(|&i| record.get(i).unwrap_or_default().to_string())
        .collect()
}

fn parse_number(
    raw: Option<&str>,
    field_name: &'static str,
    record: &str,
    issues: &mut Vec<DataQualityIssue>,
) -> Option<f64> {
    match raw {
        None => {
            issues.push(DataQualityIssue::new(
                record,
                IssueKind::MissingField { field: field_name },
            ));
            None
        }
        Some(raw) => match raw.parse::<f64>() {
            Ok(v) => Some(v),
            Err(_) => {
                issues.push(DataQualityIssue::new(
                    record,
                    IssueKind::NonNumeric {
                        field: field_name,
                        raw: raw.to_string(),
                    },
                ));
                None
            }
        },
    }
}

fn parse_unit(
    raw: Option<&str>,
    default_units: Unit,
    record: &str,
    issues: &mut Vec<DataQualityIssue>,
) -> Option<Unit> {
    match raw {
        None => Some(default_units),
        Some(raw) => match raw.parse::<Unit>() {
            Ok(unit) => Some(unit),
            Err(_) => {
                issues.push(DataQualityIssue::new(
                    record,
                    IssueKind::UnknownUnit {
                        unit: raw.to_string(),
                    },
                ));
                None
            }
        },
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn read_rows<R: Read>(
    reader: R,
    path: &str,
) -> Result<(StringRecord, Vec<StringRecord>), LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_string(),
        source,
    };
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers().map_err(csv_err)?.clone();
    let rows = rdr
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_err)?;
    Ok((headers, rows))
}

/// Per-object running hole counter for generated hole ids
///
/// Ids given explicitly in the input are reserved and never generated.
struct HoleIds {
    counters: HashMap<String, usize>,
    reserved: HashSet<String>,
}

impl HoleIds {
    fn reserving<I, S>(explicit: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            counters: HashMap::new(),
            reserved: explicit.into_iter().map(Into::into).collect(),
        }
    }

    fn next(&mut self, object_id: &str) -> String {
        let n = self.counters.entry(object_id.to_string()).or_insert(0);
        loop {
            *n += 1;
            let id = format!("{}#{}", object_id, n);
            if !self.reserved.contains(&id) {
                return id;
            }
        }
    }
}

/// Read a flat holes CSV
///
/// Returns the holes and the names of their passthrough columns.
pub fn read_holes<R: Read>(
    reader: R,
    path: &str,
    default_units: Unit,
) -> Result<(Vec<HoleRecord>, Vec<String>), LoadError> {
    let (headers, rows) = read_rows(reader, path)?;
    let columns = Columns::new(&headers);

    let object_col = columns.require(OBJECT_ID_COLUMNS, path)?;
    let length_col = columns.require(&[LENGTH_COLUMN], path)?;
    let radius_col = columns.require(&[RADIUS_COLUMN], path)?;
    let id_col = columns.find(HOLE_ID_COLUMNS);
    let units_col = columns.find(&[UNITS_COLUMN]);
    let passthrough = columns.passthrough(&[
        Some(object_col),
        Some(length_col),
        Some(radius_col),
        id_col,
        units_col,
    ]);

    let mut issues = Vec::new();
    let mut holes = Vec::with_capacity(rows.len());
    let mut ids = HoleIds::reserving(rows.iter().filter_map(|row| field(row, id_col)));

    for (row_idx, row) in rows.iter().enumerate() {
        let row_name = format!("row {}", row_idx + 2);
        let Some(object_id) = field(row, Some(object_col)) else {
            issues.push(DataQualityIssue::new(
                row_name,
                IssueKind::MissingField { field: "object_id" },
            ));
            continue;
        };
        let id = match field(row, id_col) {
            Some(id) => id.to_string(),
            None => ids.next(object_id),
        };

        let length = parse_number(field(row, Some(length_col)), "length", &id, &mut issues);
        let radius = parse_number(field(row, Some(radius_col)), "radius", &id, &mut issues);
        let units = parse_unit(field(row, units_col), default_units, &id, &mut issues);

        if let (Some(length), Some(radius), Some(units)) = (length, radius, units) {
            let mut hole = HoleRecord::new(id, object_id, length, radius).with_units(units);
            hole.extra = extras(row, &passthrough);
            holes.push(hole);
        }
    }

    if !issues.is_empty() {
        return Err(DataQualityError::new(issues).into());
    }

    let names = passthrough.iter().map(|&i| columns.names[i].clone()).collect();
    Ok((holes, names))
}

/// Read an objects CSV declaring the objects of a flat run
pub fn read_objects<R: Read>(
    reader: R,
    path: &str,
) -> Result<(Vec<ObjectRecord>, Vec<String>), LoadError> {
    let (headers, rows) = read_rows(reader, path)?;
    let columns = Columns::new(&headers);

    let object_col = columns.require(OBJECT_ID_COLUMNS, path)?;
    let passthrough = columns.passthrough(&[Some(object_col)]);

    let mut issues = Vec::new();
    let mut objects = Vec::with_capacity(rows.len());
    for (row_idx, row) in rows.iter().enumerate() {
        match field(row, Some(object_col)) {
            Some(id) => {
                let mut object = ObjectRecord::new(id);
                object.extra = extras(row, &passthrough);
                objects.push(object);
            }
            None => issues.push(DataQualityIssue::new(
                format!("row {}", row_idx + 2),
                IssueKind::MissingField { field: "object_id" },
            )),
        }
    }

    if !issues.is_empty() {
        return Err(DataQualityError::new(issues).into());
    }

    let names = passthrough.iter().map(|&i| columns.names[i].clone()).collect();
    Ok((objects, names))
}

#[derive(Debug, Deserialize)]
struct NestedHole {
    #[serde(default, alias = "hole_id")]
    id: Option<String>,
    length: f64,
    radius: f64,
}

impl NestedHole {
    fn id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// Read a nested objects CSV with a JSON `holes` column
///
/// The `holes` and `units` columns are interpreted but, like every other
/// non-id column, kept on the object so the annotated table repeats them.
pub fn read_nested<R: Read>(
    reader: R,
    path: &str,
    default_units: Unit,
) -> Result<Dataset, LoadError> {
    let (headers, rows) = read_rows(reader, path)?;
    let columns = Columns::new(&headers);

    let object_col = columns.require(OBJECT_ID_COLUMNS, path)?;
    let holes_col = columns.find(&[HOLES_COLUMN]);
    let units_col = columns.find(&[UNITS_COLUMN]);
    let passthrough = columns.passthrough(&[Some(object_col)]);

    let mut issues = Vec::new();
    let mut objects = Vec::with_capacity(rows.len());
    let mut parsed: Vec<(&str, Unit, Vec<NestedHole>)> = Vec::new();

    for (row_idx, row) in rows.iter().enumerate() {
        let Some(object_id) = field(row, Some(object_col)) else {
            issues.push(DataQualityIssue::new(
                format!("row {}", row_idx + 2),
                IssueKind::MissingField { field: "object_id" },
            ));
            continue;
        };

        let mut object = ObjectRecord::new(object_id);
        object.extra = extras(row, &passthrough);
        objects.push(object);

        let Some(units) = parse_unit(field(row, units_col), default_units, object_id, &mut issues)
        else {
            continue;
        };

        let entries: Vec<NestedHole> = match field(row, holes_col) {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Option<Vec<NestedHole>>>(raw) {
                Ok(entries) => entries.unwrap_or_default(),
                Err(e) => {
                    issues.push(DataQualityIssue::new(
                        object_id,
                        IssueKind::MalformedHoles {
                            message: e.to_string(),
                        },
                    ));
                    continue;
                }
            },
        };

        parsed.push((object_id, units, entries));
    }

    if !issues.is_empty() {
        return Err(DataQualityError::new(issues).into());
    }

    let explicit = parsed
        .iter()
        .flat_map(|(_, _, entries)| entries.iter().filter_map(|e| e.id()));
    let mut ids = HoleIds::reserving(explicit);
    let mut holes = Vec::new();
    for (object_id, units, entries) in &parsed {
        for entry in entries {
            let id = match entry.id() {
                Some(id) => id.to_string(),
                None => ids.next(object_id),
            };
            holes.push(HoleRecord::new(id, *object_id, entry.length, entry.radius).with_units(*units));
        }
    }

    let object_columns = passthrough.iter().map(|&i| columns.names[i].clone()).collect();
    Ok(Dataset::new(objects, holes).with_object_columns(object_columns))
}

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })
}

/// Load a dataset from disk
///
/// `objects` is only consulted for the flat layout; without it, objects are
/// derived from the holes.
pub fn load_dataset(
    holes: &Path,
    objects: Option<&Path>,
    layout: Layout,
    default_units: Unit,
) -> Result<Dataset, LoadError> {
    let holes_name = holes.display().to_string();
    match layout {
        Layout::Nested => read_nested(open(holes)?, &holes_name, default_units),
        Layout::Flat => {
            let (hole_records, hole_columns) =
                read_holes(open(holes)?, &holes_name, default_units)?;
            let dataset = match objects {
                Some(path) => {
                    let (object_records, object_columns) =
                        read_objects(open(path)?, &path.display().to_string())?;
                    Dataset::new(object_records, hole_records).with_object_columns(object_columns)
                }
                None => Dataset::from_holes(hole_records),
            };
            Ok(dataset.with_hole_columns(hole_columns))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issues(err: LoadError) -> Vec<DataQualityIssue> {
        match err {
            LoadError::DataQuality(e) => e.issues,
            other => panic!("expected data quality error, got {other}"),
        }
    }

    #[test]
    fn test_flat_with_aliases_and_passthrough() {
        let csv = "UUID,Length,Radius,material\nA,10,1,steel\nA,30,1,steel\nB,5,0.5,alu\n";
        let (holes, columns) = read_holes(csv.as_bytes(), "holes.csv", Unit::Mm).unwrap();

        assert_eq!(holes.len(), 3);
        assert_eq!(columns, vec!["material"]);
        assert_eq!(holes[0].id, "A#1");
        assert_eq!(holes[1].id, "A#2");
        assert_eq!(holes[2].id, "B#1");
        assert_eq!(holes[2].radius, 0.5);
        assert_eq!(holes[2].extra, vec!["alu"]);
    }

    #[test]
    fn test_flat_units_column_and_default() {
        let csv = "object_id,hole_id,length,radius,units\nA,h1,1,0.1,in\nA,h2,1,0.1,\n";
        let (holes, _) = read_holes(csv.as_bytes(), "holes.csv", Unit::Cm).unwrap();
        assert_eq!(holes[0].units, Unit::In);
        assert_eq!(holes[1].units, Unit::Cm);
    }

    #[test]
    fn test_flat_missing_column() {
        let csv = "object_id,length\nA,1\n";
        let err = read_holes(csv.as_bytes(), "holes.csv", Unit::Mm).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { column: "radius", .. }));
    }

    #[test]
    fn test_flat_collects_all_row_issues() {
        let csv = "object_id,hole_id,length,radius,units\n\
                   A,h1,abc,1,mm\n\
                   A,h2,1,,mm\n\
                   A,h3,1,1,ft\n\
                   ,h4,1,1,mm\n";
        let found = issues(read_holes(csv.as_bytes(), "holes.csv", Unit::Mm).unwrap_err());
        assert_eq!(found.len(), 4);
        assert!(matches!(&found[0].kind, IssueKind::NonNumeric { field: "length", raw } if raw == "abc"));
        assert_eq!(found[1].kind, IssueKind::MissingField { field: "radius" });
        assert!(matches!(&found[2].kind, IssueKind::UnknownUnit { unit } if unit == "ft"));
        assert_eq!(found[3].record, "row 5");
    }

    #[test]
    fn test_flat_zero_radius_is_left_to_the_pipeline() {
        let csv = "object_id,length,radius\nA,5,0\n";
        let (holes, _) = read_holes(csv.as_bytes(), "holes.csv", Unit::Mm).unwrap();
        assert_eq!(holes[0].radius, 0.0);
    }

    #[test]
    fn test_nested_layout() {
        let csv = concat!(
            "uuid,created,units,holes\n",
            "A,2021-01-01,mm,\"[{\"\"length\"\": 1, \"\"radius\"\": 1}, {\"\"length\"\": 3, \"\"radius\"\": 1}]\"\n",
            "B,2021-01-02,in,[]\n",
            "C,2021-01-03,mm,\n",
        );
        let dataset = read_nested(csv.as_bytes(), "objects.csv", Unit::Mm).unwrap();

        assert_eq!(dataset.objects.len(), 3);
        assert_eq!(dataset.object_columns, vec!["created", "units", "holes"]);
        assert_eq!(dataset.objects[1].extra, vec!["2021-01-02", "in", "[]"]);
        assert_eq!(dataset.objects[2].extra, vec!["2021-01-03", "mm", ""]);
        assert_eq!(dataset.holes.len(), 2);
        assert_eq!(dataset.holes[1].id, "A#2");
        assert_eq!(dataset.holes[1].length, 3.0);
    }

    #[test]
    fn test_generated_ids_skip_explicit_ids() {
        let csv = "object_id,hole_id,length,radius\nA,,1,1\nA,A#1,2,1\nA,,3,1\n";
        let (holes, _) = read_holes(csv.as_bytes(), "holes.csv", Unit::Mm).unwrap();
        let ids: Vec<&str> = holes.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["A#2", "A#1", "A#3"]);
    }

    #[test]
    fn test_nested_generated_ids_skip_explicit_ids() {
        let csv = concat!(
            "uuid,holes\n",
            "A,\"[{\"\"length\"\": 1, \"\"radius\"\": 1}]\"\n",
            "B,\"[{\"\"id\"\": \"\"A#1\"\", \"\"length\"\": 2, \"\"radius\"\": 1}]\"\n",
        );
        let dataset = read_nested(csv.as_bytes(), "objects.csv", Unit::Mm).unwrap();
        assert_eq!(dataset.holes[0].id, "A#2");
        assert_eq!(dataset.holes[1].id, "A#1");
    }

    #[test]
    fn test_nested_malformed_holes() {
        let csv = "uuid,holes\nA,\"[{\"\"length\"\": 1}]\"\nB,not json\n";
        let found = issues(read_nested(csv.as_bytes(), "objects.csv", Unit::Mm).unwrap_err());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].record, "A");
        assert!(matches!(found[1].kind, IssueKind::MalformedHoles { .. }));
    }

    #[test]
    fn test_objects_csv() {
        let csv = "object_id,name\nA,bracket\nEMPTY,plate\n";
        let (objects, columns) = read_objects(csv.as_bytes(), "objects.csv").unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].id, "EMPTY");
        assert_eq!(columns, vec!["name"]);
    }

    #[test]
    fn test_load_dataset_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let holes = dir.path().join("holes.csv");
        let objects = dir.path().join("objects.csv");
        std::fs::write(&holes, "object_id,length,radius\nA,10,1\n").unwrap();
        std::fs::write(&objects, "object_id\nA\nB\n").unwrap();

        let dataset = load_dataset(&holes, Some(&objects), Layout::Flat, Unit::Mm).unwrap();
        assert_eq!(dataset.objects.len(), 2);
        assert_eq!(dataset.holes.len(), 1);

        let err = load_dataset(&dir.path().join("nope.csv"), None, Layout::Flat, Unit::Mm)
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
