//! Hole and object records
//!
//! A [`Dataset`] is the loaded input of one run: the objects (parts) and the
//! holes they own. Records carry only source attributes; ratio, volume,
//! status and flags are derived by the pipeline and attached to new
//! annotated records, never written back here.

use serde::Serialize;
use std::collections::HashSet;

use crate::core::units::Unit;

/// A single hole as loaded from the input table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoleRecord {
    /// Hole identifier (unique within the dataset)
    pub id: String,

    /// Identifier of the owning object
    pub object_id: String,

    /// Hole length in `units`
    pub length: f64,

    /// Hole radius in `units`
    pub radius: f64,

    /// Unit the dimensions were recorded in
    pub units: Unit,

    /// Passthrough input columns, aligned with [`Dataset::hole_columns`]
    #[serde(skip)]
    pub extra: Vec<String>,
}

impl HoleRecord {
    pub fn new(
        id: impl Into<String>,
        object_id: impl Into<String>,
        length: f64,
        radius: f64,
    ) -> Self {
        Self {
            id: id.into(),
            object_id: object_id.into(),
            length,
            radius,
            units: Unit::Mm,
            extra: Vec::new(),
        }
    }

    pub fn with_units(mut self, units: Unit) -> Self {
        self.units = units;
        self
    }
}

/// A manufactured part owning zero or more holes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectRecord {
    /// Object identifier (unique within the dataset)
    pub id: String,

    /// Passthrough input columns, aligned with [`Dataset::object_columns`]
    #[serde(skip)]
    pub extra: Vec<String>,
}

impl ObjectRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extra: Vec::new(),
        }
    }
}

/// The in-memory input of one analysis run
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Every object of the run, in input order
    pub objects: Vec<ObjectRecord>,

    /// Every hole of the run, in input order
    pub holes: Vec<HoleRecord>,

    /// Names of the passthrough hole columns
    pub hole_columns: Vec<String>,

    /// Names of the passthrough object columns
    pub object_columns: Vec<String>,
}

impl Dataset {
    /// Build a dataset with an explicit object list
    ///
    /// Holes must reference one of the given objects; objects without any
    /// hole are kept and count as objects with zero holes.
    pub fn new(objects: Vec<ObjectRecord>, holes: Vec<HoleRecord>) -> Self {
        Self {
            objects,
            holes,
            hole_columns: Vec::new(),
            object_columns: Vec::new(),
        }
    }

    /// Build a dataset whose objects are the distinct object ids referenced
    /// by `holes`, in order of first appearance
    pub fn from_holes(holes: Vec<HoleRecord>) -> Self {
        let mut seen = HashSet::new();
        let objects = holes
            .iter()
            .filter(|h| seen.insert(h.object_id.as_str()))
            .map(|h| ObjectRecord::new(h.object_id.clone()))
            .collect();
        Self::new(objects, holes)
    }

    pub fn with_hole_columns(mut self, columns: Vec<String>) -> Self {
        self.hole_columns = columns;
        self
    }

    pub fn with_object_columns(mut self, columns: Vec<String>) -> Self {
        self.object_columns = columns;
        self
    }
}
