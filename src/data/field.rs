//! Sparse per-element vector fields.
//!
//! A [`VectorField`] maps element ids to 3-component values, remembers which
//! element kind the values live on, and keeps a weak (non-owning) reference
//! to the mesh it is defined on. The geometry reference may differ from a
//! consumer's active geometry; the extraction engine exists to reconcile the
//! two.

use std::sync::{Arc, Weak};

use hashbrown::HashMap;
use itertools::Itertools;

use crate::geometry::mesh::MeshPatch;
use crate::topology::element::ElementId;

/// Which mesh element kind a field's values are attached to.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
pub enum FieldLocation {
    Point,
    Cell,
    Interface,
    #[default]
    Undefined,
}

impl FieldLocation {
    /// `Undefined` defaults to `Point`; all other locations are themselves.
    pub fn or_point(self) -> FieldLocation {
        match self {
            FieldLocation::Undefined => FieldLocation::Point,
            loc => loc,
        }
    }
}

/// Sparse, id-keyed container of per-element `[f64; 3]` values.
#[derive(Clone, Debug, Default)]
pub struct VectorField {
    data: HashMap<ElementId, [f64; 3]>,
    location: FieldLocation,
    geometry: Weak<MeshPatch>,
}

/// Equality compares values and location only; the geometry reference is
/// identity-like and deliberately ignored.
impl PartialEq for VectorField {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location && self.data == other.data
    }
}

impl VectorField {
    /// Empty field with a location tag and no geometry.
    pub fn new(location: FieldLocation) -> Self {
        VectorField {
            data: HashMap::new(),
            location,
            geometry: Weak::new(),
        }
    }

    /// Empty field attached to `geometry`.
    pub fn on_geometry(geometry: &Arc<MeshPatch>, location: FieldLocation) -> Self {
        VectorField {
            data: HashMap::new(),
            location,
            geometry: Arc::downgrade(geometry),
        }
    }

    /// Inserts a value; returns the previous value for `id`, if any.
    pub fn insert(&mut self, id: ElementId, value: [f64; 3]) -> Option<[f64; 3]> {
        self.data.insert(id, value)
    }

    pub fn get(&self, id: ElementId) -> Option<[f64; 3]> {
        self.data.get(&id).copied()
    }

    pub fn exists(&self, id: ElementId) -> bool {
        self.data.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All ids carrying a value, ascending.
    pub fn ids(&self) -> Vec<ElementId> {
        self.data.keys().copied().sorted_unstable().collect()
    }

    /// Iterates `(id, value)` in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, [f64; 3])> + '_ {
        self.ids().into_iter().map(|id| (id, self.data[&id]))
    }

    pub fn location(&self) -> FieldLocation {
        self.location
    }

    pub fn set_location(&mut self, location: FieldLocation) {
        self.location = location;
    }

    /// Upgrades the weak geometry reference, if the mesh is still alive.
    pub fn geometry(&self) -> Option<Arc<MeshPatch>> {
        self.geometry.upgrade()
    }

    /// Attaches the field to `geometry` (weakly; the field never owns a mesh).
    pub fn set_geometry(&mut self, geometry: &Arc<MeshPatch>) {
        self.geometry = Arc::downgrade(geometry);
    }

    /// Drops all values; keeps location and geometry.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Checks that every id in the field exists in the linked geometry's
    /// element set for the field's effective location (`Undefined` is read
    /// as `Point`). Returns `false` when the geometry reference is dead.
    ///
    /// Extraction refuses to run over a field that fails this check.
    pub fn check_id_coherence(&self) -> bool {
        let Some(geom) = self.geometry() else {
            return false;
        };
        match self.location.or_point() {
            FieldLocation::Point => self.data.keys().all(|&id| geom.has_vertex(id)),
            FieldLocation::Cell => self.data.keys().all(|&id| geom.has_cell(id)),
            FieldLocation::Interface => {
                let interfaces = geom.interfaces();
                self.data.keys().all(|id| interfaces.contains_key(id))
            }
            FieldLocation::Undefined => unreachable!("or_point never yields Undefined"),
        }
    }

    /// Fills `default` for every element of the linked geometry (at the
    /// field's effective location) that carries no value yet.
    ///
    /// This is a presentation-time convenience for plotting and sinks; the
    /// extraction engine never calls it. Returns `false` when the geometry
    /// reference is dead.
    pub fn complete_missing_data(&mut self, default: [f64; 3]) -> bool {
        let Some(geom) = self.geometry() else {
            return false;
        };
        let ids = match self.location.or_point() {
            FieldLocation::Point => geom.vertex_ids(),
            FieldLocation::Cell => geom.cell_ids(),
            FieldLocation::Interface => geom.interface_ids(),
            FieldLocation::Undefined => unreachable!("or_point never yields Undefined"),
        };
        for id in ids {
            self.data.entry(id).or_insert(default);
        }
        true
    }

    /// Values in ascending id order, for dense consumers.
    pub fn as_dense_vec(&self) -> Vec<[f64; 3]> {
        self.iter().map(|(_, v)| v).collect()
    }
}
