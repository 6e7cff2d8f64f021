//! Pipeline orchestration
//!
//! `validate → geometry → classify → group → aggregate → merge → summarize`
//!
//! A run either returns a complete [`Analysis`] or fails; there is no
//! partial output. Every data-quality issue of the batch is collected
//! before aborting so the caller sees all offending records at once.

use serde::Serialize;
use tracing::{debug, info_span, warn};

use crate::analysis::aggregate::{ObjectAggregator, ObjectFlags, ObjectGroups};
use crate::analysis::classify::{Classification, HoleClassifier, Thresholds};
use crate::analysis::geometry::{self, Geometry, VolumeModel};
use crate::analysis::model::{Dataset, HoleRecord, ObjectRecord};
use crate::analysis::stats::{self, Summary};
use crate::analysis::validate;
use crate::core::config::AnalysisConfig;
use crate::core::error::{
    AnalysisError, ConfigurationError, DataQualityError, DataQualityIssue,
};

/// A hole with its derived geometry, classification and owner flags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedHole {
    #[serde(flatten)]
    pub record: HoleRecord,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(flatten)]
    pub classification: Classification,
    /// Warning flag of the owning object (not a per-hole flag)
    pub object_has_warning: bool,
    /// Error flag of the owning object (not a per-hole flag)
    pub object_has_error: bool,
}

/// An object with its aggregated flags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedObject {
    #[serde(flatten)]
    pub record: ObjectRecord,
    #[serde(flatten)]
    pub flags: ObjectFlags,
}

/// Settings a run was performed with
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSettings {
    pub thresholds: Thresholds,
    pub escalation_threshold: usize,
    pub volume_model: VolumeModel,
}

/// Complete output of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub settings: RunSettings,
    pub holes: Vec<AnnotatedHole>,
    pub objects: Vec<AnnotatedObject>,
    pub summary: Summary,
}

impl Analysis {
    /// Holes classified as unreachable
    pub fn unreachable_holes(&self) -> impl Iterator<Item = &AnnotatedHole> {
        self.holes
            .iter()
            .filter(|h| h.classification.is_unreachable())
    }

    /// Objects carrying a warning flag
    pub fn flagged_objects(&self) -> impl Iterator<Item = &AnnotatedObject> {
        self.objects.iter().filter(|o| o.flags.has_warning)
    }
}

/// A configured analysis pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    classifier: HoleClassifier,
    aggregator: ObjectAggregator,
    volume_model: VolumeModel,
    quantiles: Vec<f64>,
}

impl Pipeline {
    /// Build a pipeline, rejecting invalid configuration up front
    pub fn new(config: &AnalysisConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            classifier: HoleClassifier::new(config.thresholds)?,
            aggregator: ObjectAggregator::new(config.escalation_threshold)?,
            volume_model: config.volume_model,
            quantiles: config.quantiles.clone(),
        })
    }

    pub fn settings(&self) -> RunSettings {
        RunSettings {
            thresholds: self.classifier.thresholds(),
            escalation_threshold: self.aggregator.escalation_threshold(),
            volume_model: self.volume_model,
        }
    }

    /// Evaluate and classify a single hole
    pub fn classify_hole(
        &self,
        hole: &HoleRecord,
    ) -> Result<(Geometry, Classification), DataQualityIssue> {
        let geometry = geometry::evaluate(hole, self.volume_model)?;
        Ok((geometry, self.classifier.classify(geometry.ratio)))
    }

    /// Run the full pipeline over `dataset`
    pub fn run(&self, dataset: &Dataset) -> Result<Analysis, AnalysisError> {
        let span = info_span!(
            "analysis",
            objects = dataset.objects.len(),
            holes = dataset.holes.len()
        );
        let _guard = span.enter();

        let mut issues = validate::check_identifiers(dataset);

        let mut geometries = Vec::with_capacity(dataset.holes.len());
        for hole in &dataset.holes {
            match geometry::evaluate(hole, self.volume_model) {
                Ok(g) => geometries.push(g),
                Err(issue) => issues.push(issue),
            }
        }
        debug!(evaluated = geometries.len(), "geometry evaluated");

        let groups = match ObjectGroups::build(&dataset.objects, &dataset.holes) {
            Ok(groups) if issues.is_empty() => groups,
            Ok(_) => return Err(abort(issues)),
            Err(mut unknown) => {
                issues.append(&mut unknown);
                return Err(abort(issues));
            }
        };

        let classifications: Vec<Classification> = geometries
            .iter()
            .map(|g| self.classifier.classify(g.ratio))
            .collect();
        debug!(
            unreachable = classifications.iter().filter(|c| c.is_unreachable()).count(),
            "holes classified"
        );

        let flags = self.aggregator.aggregate(&groups, &classifications);
        debug!(objects = flags.len(), "objects aggregated");

        // Owning object position of every hole
        let mut owner = vec![0usize; dataset.holes.len()];
        for (pos, (_, members)) in groups.iter().enumerate() {
            for &i in members {
                owner[i] = pos;
            }
        }

        let holes: Vec<AnnotatedHole> = dataset
            .holes
            .iter()
            .zip(geometries)
            .zip(classifications)
            .zip(owner)
            .map(|(((record, geometry), classification), pos)| AnnotatedHole {
                record: record.clone(),
                geometry,
                classification,
                object_has_warning: flags[pos].has_warning,
                object_has_error: flags[pos].has_error,
            })
            .collect();

        let objects: Vec<AnnotatedObject> = dataset
            .objects
            .iter()
            .zip(flags)
            .map(|(record, flags)| AnnotatedObject {
                record: record.clone(),
                flags,
            })
            .collect();

        let summary = stats::summarize(&holes, &objects, &self.quantiles);
        debug!(
            flagged_objects = summary.counts.objects_with_warning,
            "summary computed"
        );

        Ok(Analysis {
            settings: self.settings(),
            holes,
            objects,
            summary,
        })
    }
}

fn abort(issues: Vec<DataQualityIssue>) -> AnalysisError {
    warn!(issues = issues.len(), "aborting run on data quality issues");
    DataQualityError::new(issues).into()
}

/// Validate `config` and run the pipeline over `dataset`
pub fn analyze(dataset: &Dataset, config: &AnalysisConfig) -> Result<Analysis, AnalysisError> {
    Pipeline::new(config)?.run(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classify::{Reachability, Severity};
    use crate::analysis::stats::Metric;
    use crate::core::error::IssueKind;
    use proptest::prelude::*;

    fn scenario_config() -> AnalysisConfig {
        AnalysisConfig {
            thresholds: Thresholds::new(2.29, 10.0),
            ..AnalysisConfig::default()
        }
    }

    /// Radius 1 so that ratio == length
    fn hole(id: &str, object: &str, ratio: f64) -> HoleRecord {
        HoleRecord::new(id, object, ratio, 1.0)
    }

    fn scenario_dataset() -> Dataset {
        Dataset::new(
            vec![
                ObjectRecord::new("A"),
                ObjectRecord::new("B"),
                ObjectRecord::new("C"),
            ],
            vec![
                hole("a1", "A", 1.0),
                hole("a2", "A", 3.0),
                hole("b1", "B", 5.0),
                hole("b2", "B", 20.0),
                hole("b3", "B", 3.0),
            ],
        )
    }

    #[test]
    fn test_scenarios_end_to_end() {
        let analysis = analyze(&scenario_dataset(), &scenario_config()).unwrap();

        let a1 = &analysis.holes[0];
        assert_eq!(a1.classification.status, Reachability::Reachable);
        assert_eq!(a1.classification.severity, Severity::Normal);
        let a2 = &analysis.holes[1];
        assert_eq!(a2.classification.status, Reachability::Unreachable);
        assert_eq!(a2.classification.severity, Severity::Poor);

        let obj_a = &analysis.objects[0].flags;
        assert!(obj_a.has_warning);
        assert!(!obj_a.has_error);

        let obj_b = &analysis.objects[1].flags;
        assert_eq!(obj_b.unreachable_count, 3);
        assert_eq!(obj_b.critical_count, 1);
        assert!(obj_b.has_warning);
        assert!(obj_b.has_error);

        let obj_c = &analysis.objects[2].flags;
        assert_eq!(obj_c.hole_count, 0);
        assert!(!obj_c.has_warning);
        assert!(!obj_c.has_error);
    }

    #[test]
    fn test_object_flags_merged_onto_holes() {
        let analysis = analyze(&scenario_dataset(), &scenario_config()).unwrap();
        // a1 is reachable but belongs to a warned object
        let a1 = &analysis.holes[0];
        assert!(a1.object_has_warning);
        assert!(!a1.object_has_error);
        assert!(!a1.classification.is_unreachable());
        assert!(analysis.holes[2..].iter().all(|h| h.object_has_error));
    }

    #[test]
    fn test_zero_hole_object_in_distribution() {
        let analysis = analyze(&scenario_dataset(), &scenario_config()).unwrap();
        let per_object = &analysis.summary.distributions[&Metric::HolesPerObject];
        assert_eq!(per_object.count, 3);
        assert_eq!(per_object.min, Some(0.0));
        assert_eq!(per_object.sum as usize, analysis.summary.counts.total_holes);
    }

    #[test]
    fn test_summary_counts() {
        let analysis = analyze(&scenario_dataset(), &scenario_config()).unwrap();
        let c = analysis.summary.counts;
        assert_eq!(c.total_objects, 3);
        assert_eq!(c.objects_with_holes, 2);
        assert_eq!(c.objects_with_warning, 2);
        assert_eq!(c.objects_with_error, 1);
        assert_eq!(c.objects_with_critical_holes, 1);
        assert_eq!(c.total_holes, 5);
        assert_eq!(c.unreachable_holes, 4);
        assert_eq!(c.critical_holes, 1);
        assert_eq!(c.poor_holes, 3);
    }

    #[test]
    fn test_zero_radius_aborts_without_output() {
        let mut dataset = scenario_dataset();
        dataset.holes.push(HoleRecord::new("bad", "A", 4.0, 0.0));

        let err = analyze(&dataset, &scenario_config()).unwrap_err();
        match err {
            AnalysisError::DataQuality(e) => {
                assert_eq!(e.records(), vec!["bad"]);
                assert_eq!(e.issues[0].kind, IssueKind::ZeroRadius);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_overflowing_volume_aborts() {
        let mut dataset = scenario_dataset();
        dataset.holes.push(HoleRecord::new("huge", "B", 1e300, 1e10));

        let Err(AnalysisError::DataQuality(e)) = analyze(&dataset, &scenario_config()) else {
            panic!("expected data quality error");
        };
        assert_eq!(e.records(), vec!["huge"]);
        assert_eq!(e.issues[0].kind, IssueKind::Overflow { field: "volume_mm3" });
    }

    #[test]
    fn test_all_issues_reported_together() {
        let mut dataset = scenario_dataset();
        dataset.holes.push(HoleRecord::new("zero", "A", 4.0, 0.0));
        dataset.holes.push(HoleRecord::new("orphan", "GHOST", 4.0, 1.0));
        dataset.holes.push(HoleRecord::new("a1", "A", 4.0, 1.0));

        let Err(AnalysisError::DataQuality(e)) = analyze(&dataset, &scenario_config()) else {
            panic!("expected data quality error");
        };
        let records = e.records();
        assert!(records.contains(&"zero"));
        assert!(records.contains(&"orphan"));
        assert!(records.contains(&"a1"));
    }

    #[test]
    fn test_invalid_config_rejected_before_records() {
        // Dataset is also invalid; the configuration error must win
        let mut dataset = scenario_dataset();
        dataset.holes.push(HoleRecord::new("bad", "A", 4.0, 0.0));
        let config = AnalysisConfig {
            thresholds: Thresholds::new(10.0, 2.0),
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            analyze(&dataset, &config),
            Err(AnalysisError::Configuration(
                ConfigurationError::NonMonotonicThresholds { .. }
            ))
        ));

        let config = AnalysisConfig {
            escalation_threshold: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            Pipeline::new(&config),
            Err(ConfigurationError::InvalidEscalation(0))
        ));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let dataset = scenario_dataset();
        let before = dataset.holes.clone();
        let analysis = analyze(&dataset, &scenario_config()).unwrap();
        assert_eq!(dataset.holes, before);
        let records: Vec<HoleRecord> = analysis.holes.iter().map(|h| h.record.clone()).collect();
        assert_eq!(records, before);
    }

    #[test]
    fn test_reaggregating_annotated_holes_is_idempotent() {
        let dataset = scenario_dataset();
        let analysis = analyze(&dataset, &scenario_config()).unwrap();

        let records: Vec<HoleRecord> = analysis.holes.iter().map(|h| h.record.clone()).collect();
        let objects: Vec<ObjectRecord> =
            analysis.objects.iter().map(|o| o.record.clone()).collect();
        let statuses: Vec<Classification> =
            analysis.holes.iter().map(|h| h.classification).collect();

        let groups = ObjectGroups::build(&objects, &records).unwrap();
        let again = ObjectAggregator::default().aggregate(&groups, &statuses);
        let original: Vec<ObjectFlags> = analysis.objects.iter().map(|o| o.flags).collect();
        assert_eq!(again, original);
    }

    #[test]
    fn test_empty_dataset() {
        let analysis = analyze(&Dataset::default(), &AnalysisConfig::default()).unwrap();
        assert!(analysis.holes.is_empty());
        assert_eq!(analysis.summary.counts.total_objects, 0);
        assert_eq!(analysis.summary.distributions[&Metric::Ratio].count, 0);
    }

    #[test]
    fn test_classify_single_hole() {
        let pipeline = Pipeline::new(&AnalysisConfig::default()).unwrap();
        let (geometry, classification) = pipeline
            .classify_hole(&HoleRecord::new("h", "A", 100.0, 1.0))
            .unwrap();
        assert_eq!(geometry.ratio, 100.0);
        assert_eq!(classification.severity, Severity::Critical);
    }

    fn arb_dataset() -> impl Strategy<Value = Dataset> {
        (1usize..8, proptest::collection::vec((0usize..8, 0.1f64..40.0, 0.1f64..5.0), 0..60))
            .prop_map(|(n_objects, holes)| {
                let objects = (0..n_objects)
                    .map(|i| ObjectRecord::new(format!("O{}", i)))
                    .collect();
                let holes = holes
                    .into_iter()
                    .enumerate()
                    .map(|(i, (o, length, radius))| {
                        HoleRecord::new(format!("H{}", i), format!("O{}", o % n_objects), length, radius)
                    })
                    .collect();
                Dataset::new(objects, holes)
            })
    }

    proptest! {
        #[test]
        fn prop_summary_identities(dataset in arb_dataset()) {
            let analysis = analyze(&dataset, &AnalysisConfig::default()).unwrap();
            let c = analysis.summary.counts;

            let unreachable_sum: usize =
                analysis.objects.iter().map(|o| o.flags.unreachable_count).sum();
            prop_assert_eq!(c.unreachable_holes, unreachable_sum);
            prop_assert!(c.objects_with_warning <= c.total_objects);
            prop_assert!(c.objects_with_error <= c.objects_with_warning);

            let per_object = &analysis.summary.distributions[&Metric::HolesPerObject];
            prop_assert_eq!(per_object.sum as usize, c.total_holes);
            prop_assert_eq!(per_object.count, c.total_objects);

            for h in &analysis.holes {
                prop_assert_eq!(h.geometry.ratio, h.record.length / h.record.radius);
            }
        }
    }
}
