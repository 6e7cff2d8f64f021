//! Statistics summarizer - dataset counts and distributions
//!
//! Distributions mirror the usual dataframe `describe()`: mean, sample
//! standard deviation and quantiles computed by linear interpolation
//! between closest ranks.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::analysis::pipeline::{AnnotatedHole, AnnotatedObject};

/// Quantiles reported by default (0 % and 100 % are min and max)
pub const DEFAULT_QUANTILES: [f64; 9] = [0.0, 0.01, 0.05, 0.25, 0.5, 0.75, 0.95, 0.99, 1.0];

/// A metric with a distribution in the summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    LengthMm,
    RadiusMm,
    VolumeMm3,
    Ratio,
    HolesPerObject,
    UnreachableHolesPerObject,
    CriticalHolesPerObject,
}

impl Metric {
    /// Stable key used in machine-readable output
    pub fn key(self) -> &'static str {
        match self {
            Metric::LengthMm => "length_mm",
            Metric::RadiusMm => "radius_mm",
            Metric::VolumeMm3 => "volume_mm3",
            Metric::Ratio => "ratio",
            Metric::HolesPerObject => "holes_per_object",
            Metric::UnreachableHolesPerObject => "unreachable_holes_per_object",
            Metric::CriticalHolesPerObject => "critical_holes_per_object",
        }
    }

    /// Human-readable column label
    pub fn label(self) -> &'static str {
        match self {
            Metric::LengthMm => "length (mm)",
            Metric::RadiusMm => "radius (mm)",
            Metric::VolumeMm3 => "volume (mm³)",
            Metric::Ratio => "ratio",
            Metric::HolesPerObject => "holes/object",
            Metric::UnreachableHolesPerObject => "unreachable/object",
            Metric::CriticalHolesPerObject => "critical/object",
        }
    }

    /// Whether values are counts (rendered without decimals)
    pub fn is_count(self) -> bool {
        matches!(
            self,
            Metric::HolesPerObject
                | Metric::UnreachableHolesPerObject
                | Metric::CriticalHolesPerObject
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Value of a single quantile
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantileValue {
    pub q: f64,
    pub value: f64,
}

/// Summary of a sample of values
///
/// Every statistic is `None` for an empty sample; `std_dev` is also `None`
/// for a single value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub count: usize,
    pub sum: f64,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub median: Option<f64>,
    pub quantiles: Vec<QuantileValue>,

    #[serde(skip)]
    sorted: Vec<f64>,
}

impl Distribution {
    pub fn from_values<I>(values: I, quantiles: &[f64]) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted: Vec<f64> = values.into_iter().collect();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();
        let mean = (count > 0).then(|| sum / count as f64);
        let std_dev = mean.filter(|_| count > 1).map(|m| {
            let ss: f64 = sorted.iter().map(|x| (x - m).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        });

        let mut dist = Self {
            count,
            sum,
            mean,
            std_dev,
            min: sorted.first().copied(),
            max: sorted.last().copied(),
            median: None,
            quantiles: Vec::new(),
            sorted,
        };
        dist.median = dist.percentile(0.5);
        dist.quantiles = quantiles
            .iter()
            .filter_map(|&q| dist.percentile(q).map(|value| QuantileValue { q, value }))
            .collect();
        dist
    }

    /// Value at quantile `q` (0.0 ..= 1.0), linearly interpolated
    ///
    /// Returns `None` for an empty sample or a `q` outside `[0, 1]`.
    pub fn percentile(&self, q: f64) -> Option<f64> {
        if self.sorted.is_empty() || !(0.0..=1.0).contains(&q) {
            return None;
        }
        let pos = q * (self.sorted.len() - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        let (a, b) = (self.sorted[lo], self.sorted[hi]);
        Some(a + (b - a) * (pos - lo as f64))
    }
}

/// Dataset-level counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Counts {
    pub total_objects: usize,
    pub objects_with_holes: usize,
    /// Objects with at least one unreachable hole
    pub objects_with_warning: usize,
    /// Objects at or above the escalation threshold
    pub objects_with_error: usize,
    pub objects_with_critical_holes: usize,
    pub objects_with_multiple_critical_holes: usize,
    pub total_holes: usize,
    pub unreachable_holes: usize,
    pub poor_holes: usize,
    pub critical_holes: usize,
}

/// Population a count is a share of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CountGroup {
    Objects,
    Holes,
}

/// One line of the counts table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountLine {
    pub group: CountGroup,
    pub key: &'static str,
    pub label: &'static str,
    pub absolute: usize,
    /// Share of the group's population, 0.0 when the population is empty
    pub percentage: f64,
}

impl Counts {
    /// Counts with their share of the relevant population
    pub fn lines(&self) -> Vec<CountLine> {
        let share = |n: usize, total: usize| {
            if total == 0 {
                0.0
            } else {
                n as f64 / total as f64
            }
        };
        let objects = |key: &'static str, label: &'static str, n: usize| CountLine {
            group: CountGroup::Objects,
            key,
            label,
            absolute: n,
            percentage: share(n, self.total_objects),
        };
        let holes = |key: &'static str, label: &'static str, n: usize| CountLine {
            group: CountGroup::Holes,
            key,
            label,
            absolute: n,
            percentage: share(n, self.total_holes),
        };

        vec![
            objects("total_objects", "Total objects", self.total_objects),
            objects("objects_with_holes", "Objects with holes", self.objects_with_holes),
            objects(
                "objects_with_warning",
                "Objects with unreachable holes (warning)",
                self.objects_with_warning,
            ),
            objects(
                "objects_with_error",
                "Objects at escalation threshold (error)",
                self.objects_with_error,
            ),
            objects(
                "objects_with_critical_holes",
                "Objects with critical ratio holes",
                self.objects_with_critical_holes,
            ),
            objects(
                "objects_with_multiple_critical_holes",
                "Objects with 2 or more critical ratio holes",
                self.objects_with_multiple_critical_holes,
            ),
            holes("total_holes", "Total holes", self.total_holes),
            holes("unreachable_holes", "Unreachable holes", self.unreachable_holes),
            holes("poor_holes", "Holes with poor ratio", self.poor_holes),
            holes("critical_holes", "Holes with critical ratio", self.critical_holes),
        ]
    }
}

/// Counts and distributions of a processed dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub counts: Counts,
    pub distributions: BTreeMap<Metric, Distribution>,
}

/// Summarize the annotated holes and objects of a run
///
/// Read-only: the annotated records are not modified. Objects without
/// holes contribute a 0 to every per-object distribution.
pub fn summarize(
    holes: &[AnnotatedHole],
    objects: &[AnnotatedObject],
    quantiles: &[f64],
) -> Summary {
    let mut counts = Counts {
        total_objects: objects.len(),
        total_holes: holes.len(),
        ..Counts::default()
    };

    for hole in holes {
        if hole.classification.is_unreachable() {
            counts.unreachable_holes += 1;
        }
        if hole.classification.is_critical() {
            counts.critical_holes += 1;
        }
    }
    counts.poor_holes = counts.unreachable_holes - counts.critical_holes;

    for object in objects {
        let f = &object.flags;
        if f.hole_count > 0 {
            counts.objects_with_holes += 1;
        }
        if f.has_warning {
            counts.objects_with_warning += 1;
        }
        if f.has_error {
            counts.objects_with_error += 1;
        }
        if f.critical_count >= 1 {
            counts.objects_with_critical_holes += 1;
        }
        if f.critical_count >= 2 {
            counts.objects_with_multiple_critical_holes += 1;
        }
    }

    let per_hole = |get: fn(&AnnotatedHole) -> f64| {
        Distribution::from_values(holes.iter().map(get), quantiles)
    };
    let per_object = |get: fn(&AnnotatedObject) -> usize| {
        Distribution::from_values(objects.iter().map(|o| get(o) as f64), quantiles)
    };

    let mut distributions = BTreeMap::new();
    distributions.insert(Metric::LengthMm, per_hole(|h| h.geometry.length_mm));
    distributions.insert(Metric::RadiusMm, per_hole(|h| h.geometry.radius_mm));
    distributions.insert(Metric::VolumeMm3, per_hole(|h| h.geometry.volume_mm3));
    distributions.insert(Metric::Ratio, per_hole(|h| h.geometry.ratio));
    distributions.insert(Metric::HolesPerObject, per_object(|o| o.flags.hole_count));
    distributions.insert(
        Metric::UnreachableHolesPerObject,
        per_object(|o| o.flags.unreachable_count),
    );
    distributions.insert(
        Metric::CriticalHolesPerObject,
        per_object(|o| o.flags.critical_count),
    );

    Summary {
        counts,
        distributions,
    }
}
