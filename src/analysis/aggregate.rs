//! Object aggregation - per-object warning/error flags
//!
//! Holes are grouped by object identifier once ([`ObjectGroups`]), then each
//! object's flags are computed from the statuses of its own holes. Flags are
//! an object-level property: they are never written onto individual holes
//! as per-hole flags.

use serde::Serialize;
use std::collections::HashMap;

use crate::analysis::classify::Classification;
use crate::analysis::model::{HoleRecord, ObjectRecord};
use crate::core::error::{ConfigurationError, DataQualityIssue, IssueKind};

/// Default number of unreachable holes that escalates a warning to an error
pub const DEFAULT_ESCALATION_THRESHOLD: usize = 2;

/// Mapping from object identifier to the ordered indices of its holes
///
/// Objects keep their input order; within an object, holes keep their
/// input order.
#[derive(Debug, Clone)]
pub struct ObjectGroups {
    object_ids: Vec<String>,
    members: Vec<Vec<usize>>,
}

impl ObjectGroups {
    /// Group `holes` under `objects` in a single pass
    ///
    /// Every hole must reference one of `objects`; unknown references are
    /// returned as data-quality issues rather than dropped.
    pub fn build(
        objects: &[ObjectRecord],
        holes: &[HoleRecord],
    ) -> Result<Self, Vec<DataQualityIssue>> {
        let mut index = HashMap::with_capacity(objects.len());
        let mut object_ids = Vec::with_capacity(objects.len());
        for object in objects {
            if !index.contains_key(&object.id) {
                index.insert(object.id.clone(), object_ids.len());
                object_ids.push(object.id.clone());
            }
        }

        let mut members = vec![Vec::new(); object_ids.len()];
        let mut issues = Vec::new();
        for (i, hole) in holes.iter().enumerate() {
            match index.get(&hole.object_id) {
                Some(&slot) => members[slot].push(i),
                None => issues.push(DataQualityIssue::new(
                    &hole.id,
                    IssueKind::UnknownObject {
                        object_id: hole.object_id.clone(),
                    },
                )),
            }
        }

        if !issues.is_empty() {
            return Err(issues);
        }

        Ok(Self {
            object_ids,
            members,
        })
    }

    /// Iterate `(object_id, hole indices)` in object order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.object_ids
            .iter()
            .map(String::as_str)
            .zip(self.members.iter().map(Vec::as_slice))
    }
}

/// Aggregated flags of one object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ObjectFlags {
    pub hole_count: usize,
    pub unreachable_count: usize,
    pub critical_count: usize,
    pub has_warning: bool,
    pub has_error: bool,
}

/// Rolls per-hole statuses up into per-object flags
#[derive(Debug, Clone, Copy)]
pub struct ObjectAggregator {
    escalation_threshold: usize,
}

impl ObjectAggregator {
    pub fn new(escalation_threshold: usize) -> Result<Self, ConfigurationError> {
        if escalation_threshold < 1 {
            return Err(ConfigurationError::InvalidEscalation(escalation_threshold));
        }
        Ok(Self {
            escalation_threshold,
        })
    }

    pub fn escalation_threshold(&self) -> usize {
        self.escalation_threshold
    }

    /// Flags for a single object given its holes' classifications
    pub fn flags<'a, I>(&self, classifications: I) -> ObjectFlags
    where
        I: IntoIterator<Item = &'a Classification>,
    {
        let mut flags = ObjectFlags::default();
        for c in classifications {
            flags.hole_count += 1;
            if c.is_unreachable() {
                flags.unreachable_count += 1;
            }
            if c.is_critical() {
                flags.critical_count += 1;
            }
        }
        flags.has_warning = flags.unreachable_count >= 1;
        flags.has_error = flags.unreachable_count >= self.escalation_threshold;
        flags
    }

    /// Flags for every object of `groups`, in group order
    ///
    /// `classifications` is indexed like the holes the groups were built
    /// from.
    pub fn aggregate(
        &self,
        groups: &ObjectGroups,
        classifications: &[Classification],
    ) -> Vec<ObjectFlags> {
        groups
            .iter()
            .map(|(_, members)| self.flags(members.iter().map(|&i| &classifications[i])))
            .collect()
    }
}

impl Default for ObjectAggregator {
    fn default() -> Self {
        Self {
            escalation_threshold: DEFAULT_ESCALATION_THRESHOLD,
        }
    }
}
