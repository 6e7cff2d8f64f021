//! Geometry evaluation - derived per-hole quantities
//!
//! The ratio is dimensionless (`length / radius`), so it is computed on the
//! recorded values. Volume is reported in mm³ and therefore computed on the
//! dimensions converted to millimetres.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::analysis::model::HoleRecord;
use crate::core::error::{DataQualityIssue, IssueKind};

/// Half of the standard 118° twist-drill point angle, in degrees
const DRILL_POINT_HALF_ANGLE_DEG: f64 = 59.0;

/// Solid used to compute a hole's volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeModel {
    /// Flat-bottomed cylinder: `π · r² · L`
    #[default]
    Cylinder,
    /// Cylinder plus a 118° drill-point cone: `π · r² · L + π · r² · h / 3`
    /// with `h = r / tan(59°)`
    DrillPoint,
}

impl VolumeModel {
    /// Volume in the cube of the input unit
    pub fn volume(self, radius: f64, length: f64) -> f64 {
        let area = PI * radius * radius;
        match self {
            VolumeModel::Cylinder => area * length,
            VolumeModel::DrillPoint => {
                let tip_height = radius / DRILL_POINT_HALF_ANGLE_DEG.to_radians().tan();
                area * length + area * tip_height / 3.0
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VolumeModel::Cylinder => "cylinder",
            VolumeModel::DrillPoint => "drill-point",
        }
    }
}

impl fmt::Display for VolumeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VolumeModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "cylinder" => Ok(VolumeModel::Cylinder),
            "drill-point" | "drill" => Ok(VolumeModel::DrillPoint),
            _ => Err(format!(
                "Unsupported volume model: '{}'. Supported: cylinder, drill-point",
                s.trim()
            )),
        }
    }
}

/// Derived geometry of a single hole
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geometry {
    /// `length / radius`
    pub ratio: f64,
    pub length_mm: f64,
    pub radius_mm: f64,
    pub volume_mm3: f64,
}

/// Compute `length / radius`
///
/// Fails when either dimension is not finite, when the radius is zero or
/// negative, or when the length is not strictly positive.
pub fn ratio(length: f64, radius: f64) -> Result<f64, IssueKind> {
    check_dimensions(length, radius)?;
    Ok(length / radius)
}

fn check_dimensions(length: f64, radius: f64) -> Result<(), IssueKind> {
    if !length.is_finite() {
        return Err(IssueKind::NonFinite { field: "length" });
    }
    if !radius.is_finite() {
        return Err(IssueKind::NonFinite { field: "radius" });
    }
    if radius == 0.0 {
        return Err(IssueKind::ZeroRadius);
    }
    if radius < 0.0 {
        return Err(IssueKind::NonPositive {
            field: "radius",
            value: radius,
        });
    }
    if length <= 0.0 {
        return Err(IssueKind::NonPositive {
            field: "length",
            value: length,
        });
    }
    Ok(())
}

/// Evaluate the derived geometry of a hole
pub fn evaluate(hole: &HoleRecord, model: VolumeModel) -> Result<Geometry, DataQualityIssue> {
    let ratio =
        ratio(hole.length, hole.radius).map_err(|kind| DataQualityIssue::new(&hole.id, kind))?;

    let factor = hole.units.to_mm();
    let length_mm = hole.length * factor;
    let radius_mm = hole.radius * factor;
    let geometry = Geometry {
        ratio,
        length_mm,
        radius_mm,
        volume_mm3: model.volume(radius_mm, length_mm),
    };

    // Finite inputs can still overflow once divided, converted or cubed
    let derived = [
        ("ratio", geometry.ratio),
        ("length_mm", geometry.length_mm),
        ("radius_mm", geometry.radius_mm),
        ("volume_mm3", geometry.volume_mm3),
    ];
    if let Some(&(field, _)) = derived.iter().find(|(_, v)| !v.is_finite()) {
        return Err(DataQualityIssue::new(&hole.id, IssueKind::Overflow { field }));
    }
    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::units::Unit;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn test_ratio_is_exact_division() {
        assert_eq!(ratio(30.0, 1.5).unwrap(), 30.0 / 1.5);
        assert_eq!(ratio(1.0, 3.0).unwrap(), 1.0 / 3.0);
    }

    #[test]
    fn test_zero_radius_is_rejected() {
        assert_eq!(ratio(10.0, 0.0), Err(IssueKind::ZeroRadius));
        assert_eq!(ratio(10.0, -0.0), Err(IssueKind::ZeroRadius));
    }

    #[test]
    fn test_negative_and_non_finite_dimensions() {
        assert!(matches!(
            ratio(10.0, -1.0),
            Err(IssueKind::NonPositive { field: "radius", .. })
        ));
        assert!(matches!(
            ratio(0.0, 1.0),
            Err(IssueKind::NonPositive { field: "length", .. })
        ));
        assert_eq!(
            ratio(f64::NAN, 1.0),
            Err(IssueKind::NonFinite { field: "length" })
        );
        assert_eq!(
            ratio(1.0, f64::INFINITY),
            Err(IssueKind::NonFinite { field: "radius" })
        );
    }

    #[test]
    fn test_cylinder_volume() {
        let hole = HoleRecord::new("h1", "A", 10.0, 2.0);
        let geom = evaluate(&hole, VolumeModel::Cylinder).unwrap();
        assert!(approx(geom.volume_mm3, PI * 4.0 * 10.0));
        assert_eq!(geom.ratio, 5.0);
    }

    #[test]
    fn test_drill_point_adds_cone() {
        let cylinder = VolumeModel::Cylinder.volume(1.0, 10.0);
        let drilled = VolumeModel::DrillPoint.volume(1.0, 10.0);
        let tip = PI / 3.0 / 59.0_f64.to_radians().tan();
        assert!(approx(drilled - cylinder, tip));
    }

    #[test]
    fn test_units_convert_volume_not_ratio() {
        let hole = HoleRecord::new("h1", "A", 1.0, 0.5).with_units(Unit::In);
        let geom = evaluate(&hole, VolumeModel::Cylinder).unwrap();
        assert_eq!(geom.ratio, 2.0);
        assert!(approx(geom.length_mm, 25.4));
        assert!(approx(geom.radius_mm, 12.7));
        assert!(approx(geom.volume_mm3, PI * 12.7 * 12.7 * 25.4));
    }

    #[test]
    fn test_evaluate_reports_hole_id() {
        let hole = HoleRecord::new("H-42", "A", 5.0, 0.0);
        let issue = evaluate(&hole, VolumeModel::Cylinder).unwrap_err();
        assert_eq!(issue.record, "H-42");
        assert_eq!(issue.kind, IssueKind::ZeroRadius);
    }

    #[test]
    fn test_overflowing_volume_is_rejected() {
        let hole = HoleRecord::new("huge", "A", 1e300, 1e10);
        let issue = evaluate(&hole, VolumeModel::Cylinder).unwrap_err();
        assert_eq!(issue.record, "huge");
        assert_eq!(issue.kind, IssueKind::Overflow { field: "volume_mm3" });

        let hole = HoleRecord::new("thin", "A", 1e300, 1e-300);
        let issue = evaluate(&hole, VolumeModel::Cylinder).unwrap_err();
        assert_eq!(issue.kind, IssueKind::Overflow { field: "ratio" });
    }

    #[test]
    fn test_volume_model_parse() {
        assert_eq!("cylinder".parse::<VolumeModel>().unwrap(), VolumeModel::Cylinder);
        assert_eq!("drill_point".parse::<VolumeModel>().unwrap(), VolumeModel::DrillPoint);
        assert!("sphere".parse::<VolumeModel>().is_err());
    }
}
