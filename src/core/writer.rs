//! Annotated table output
//!
//! Both tables repeat the input columns (passthrough included) and append
//! the derived columns.

use std::io::Write;

use crate::analysis::pipeline::{AnnotatedHole, AnnotatedObject};

/// Derived columns appended to every hole row
pub const HOLE_DERIVED_COLUMNS: &[&str] = &[
    "ratio",
    "volume_mm3",
    "status",
    "severity",
    "object_has_warning",
    "object_has_error",
];

/// Derived columns appended to every object row
pub const OBJECT_DERIVED_COLUMNS: &[&str] = &[
    "hole_count",
    "unreachable_count",
    "critical_count",
    "has_warning",
    "has_error",
];

/// Write annotated holes as CSV
///
/// `extra_columns` names the passthrough values carried by each hole.
pub fn write_holes<W: Write>(
    writer: W,
    holes: &[AnnotatedHole],
    extra_columns: &[String],
) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["hole_id", "object_id", "length", "radius", "units"];
    header.extend(extra_columns.iter().map(String::as_str));
    header.extend_from_slice(HOLE_DERIVED_COLUMNS);
    wtr.write_record(&header)?;

    for hole in holes {
        let mut row = vec![
            hole.record.id.clone(),
            hole.record.object_id.clone(),
            hole.record.length.to_string(),
            hole.record.radius.to_string(),
            hole.record.units.to_string(),
        ];
        row.extend(padded(&hole.record.extra, extra_columns.len()));
        row.extend([
            hole.geometry.ratio.to_string(),
            hole.geometry.volume_mm3.to_string(),
            hole.classification.status.to_string(),
            hole.classification.severity.to_string(),
            hole.object_has_warning.to_string(),
            hole.object_has_error.to_string(),
        ]);
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write annotated objects as CSV
pub fn write_objects<W: Write>(
    writer: W,
    objects: &[AnnotatedObject],
    extra_columns: &[String],
) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["object_id"];
    header.extend(extra_columns.iter().map(String::as_str));
    header.extend_from_slice(OBJECT_DERIVED_COLUMNS);
    wtr.write_record(&header)?;

    for object in objects {
        let mut row = vec![object.record.id.clone()];
        row.extend(padded(&object.record.extra, extra_columns.len()));
        row.extend([
            object.flags.hole_count.to_string(),
            object.flags.unreachable_count.to_string(),
            object.flags.critical_count.to_string(),
            object.flags.has_warning.to_string(),
            object.flags.has_error.to_string(),
        ]);
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Passthrough values stretched or cut to the header width
fn padded(values: &[String], width: usize) -> impl Iterator<Item = String> + '_ {
    values
        .iter()
        .cloned()
        .chain(std::iter::repeat(String::new()))
        .take(width)
}
