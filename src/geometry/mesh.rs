//! `MeshPatch`: the in-memory mesh collaborator.
//!
//! The execution core consumes geometry through a narrow contract: enumerate
//! points, cells, and interfaces by stable identifier, expose a spatial index
//! over the cells, and report per-cell region tags. `MeshPatch` is that
//! contract made concrete for surface meshes of polygonal cells.
//!
//! Interfaces (edges shared between cells, plus boundary edges) and the
//! skd-tree are derived caches: built on first demand, dropped on any
//! topology mutation. All id-list queries return sorted, deduplicated
//! vectors so downstream iteration is deterministic.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::geometry::bbox::Aabb;
use crate::geometry::skd_tree::SkdTree;
use crate::topology::element::ElementId;

/// Errors raised by mesh topology edits.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Vertex id already present.
    #[error("vertex {0} already exists")]
    DuplicateVertex(ElementId),
    /// Cell id already present.
    #[error("cell {0} already exists")]
    DuplicateCell(ElementId),
    /// Cell references a vertex the mesh does not contain.
    #[error("cell {cell} references unknown vertex {vertex}")]
    UnknownVertex { cell: ElementId, vertex: ElementId },
    /// Referenced cell does not exist.
    #[error("cell {0} does not exist")]
    UnknownCell(ElementId),
    /// Polygonal cells need at least three vertices.
    #[error("cell {cell} is degenerate ({nverts} vertices)")]
    DegenerateCell { cell: ElementId, nverts: usize },
}

/// A polygonal surface cell: vertex connectivity plus a region (PID) tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    /// Vertex ids in winding order.
    pub connectivity: Vec<ElementId>,
    /// Region tag; coarse partition label used for selective extraction.
    pub region: i32,
}

/// An edge between two cells, or a boundary edge of a single cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interface {
    /// The edge's endpoints, ascending.
    pub vertices: [ElementId; 2],
    /// Adjacent cell ids (one for boundary edges, two otherwise).
    pub cells: Vec<ElementId>,
}

/// Mesh of polygonal cells with per-cell region tags and derived caches.
#[derive(Debug, Default)]
pub struct MeshPatch {
    vertices: HashMap<ElementId, [f64; 3]>,
    cells: HashMap<ElementId, Cell>,
    interfaces: OnceCell<HashMap<ElementId, Interface>>,
    skd: OnceCell<Arc<SkdTree>>,
}

impl Clone for MeshPatch {
    fn clone(&self) -> Self {
        // Derived caches are not carried over; the clone rebuilds on demand.
        MeshPatch {
            vertices: self.vertices.clone(),
            cells: self.cells.clone(),
            interfaces: OnceCell::new(),
            skd: OnceCell::new(),
        }
    }
}

impl MeshPatch {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    // --- topology edits -----------------------------------------------------

    /// Adds a vertex at `coords`.
    pub fn add_vertex(&mut self, id: ElementId, coords: [f64; 3]) -> Result<(), GeometryError> {
        if self.vertices.contains_key(&id) {
            return Err(GeometryError::DuplicateVertex(id));
        }
        self.vertices.insert(id, coords);
        self.invalidate_caches();
        Ok(())
    }

    /// Adds a polygonal cell over existing vertices with a region tag.
    pub fn add_cell(
        &mut self,
        id: ElementId,
        connectivity: Vec<ElementId>,
        region: i32,
    ) -> Result<(), GeometryError> {
        if self.cells.contains_key(&id) {
            return Err(GeometryError::DuplicateCell(id));
        }
        if connectivity.len() < 3 {
            return Err(GeometryError::DegenerateCell {
                cell: id,
                nverts: connectivity.len(),
            });
        }
        for &v in &connectivity {
            if !self.vertices.contains_key(&v) {
                return Err(GeometryError::UnknownVertex { cell: id, vertex: v });
            }
        }
        self.cells.insert(id, Cell { connectivity, region });
        self.invalidate_caches();
        Ok(())
    }

    /// Retags a cell's region.
    pub fn set_region(&mut self, cell: ElementId, region: i32) -> Result<(), GeometryError> {
        let entry = self
            .cells
            .get_mut(&cell)
            .ok_or(GeometryError::UnknownCell(cell))?;
        entry.region = region;
        Ok(())
    }

    /// Removes a cell; its vertices stay.
    pub fn remove_cell(&mut self, cell: ElementId) -> Result<(), GeometryError> {
        if self.cells.remove(&cell).is_none() {
            return Err(GeometryError::UnknownCell(cell));
        }
        self.invalidate_caches();
        Ok(())
    }

    fn invalidate_caches(&mut self) {
        self.interfaces.take();
        self.skd.take();
    }

    // --- element access -----------------------------------------------------

    /// Vertex coordinates, if the vertex exists.
    pub fn vertex(&self, id: ElementId) -> Option<[f64; 3]> {
        self.vertices.get(&id).copied()
    }

    /// Cell connectivity and region, if the cell exists.
    pub fn cell(&self, id: ElementId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    pub fn has_vertex(&self, id: ElementId) -> bool {
        self.vertices.contains_key(&id)
    }

    pub fn has_cell(&self, id: ElementId) -> bool {
        self.cells.contains_key(&id)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// All vertex ids, ascending.
    pub fn vertex_ids(&self) -> Vec<ElementId> {
        self.vertices.keys().copied().sorted_unstable().collect()
    }

    /// All cell ids, ascending.
    pub fn cell_ids(&self) -> Vec<ElementId> {
        self.cells.keys().copied().sorted_unstable().collect()
    }

    // --- region tags ---------------------------------------------------------

    /// Distinct region tags present on the mesh, ascending.
    pub fn region_tags(&self) -> Vec<i32> {
        self.cells
            .values()
            .map(|c| c.region)
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// Cell ids whose region tag is in `tags`, ascending.
    pub fn cells_with_regions(&self, tags: &[i32]) -> Vec<ElementId> {
        let wanted: HashSet<i32> = tags.iter().copied().collect();
        self.cells
            .iter()
            .filter(|(_, c)| wanted.contains(&c.region))
            .map(|(&id, _)| id)
            .sorted_unstable()
            .collect()
    }

    // --- derived element sets -----------------------------------------------

    /// Vertex ids referenced by any cell in `cells`, ascending.
    pub fn vertices_of_cells(&self, cells: &[ElementId]) -> Vec<ElementId> {
        let mut out: HashSet<ElementId> = HashSet::new();
        for id in cells {
            if let Some(cell) = self.cells.get(id) {
                out.extend(cell.connectivity.iter().copied());
            }
        }
        out.into_iter().sorted_unstable().collect()
    }

    /// Interface ids adjacent to any cell in `cells`, ascending.
    ///
    /// Builds the interface set on demand.
    pub fn interfaces_of_cells(&self, cells: &[ElementId]) -> Vec<ElementId> {
        let wanted: HashSet<ElementId> = cells.iter().copied().collect();
        self.interfaces()
            .iter()
            .filter(|(_, itf)| itf.cells.iter().any(|c| wanted.contains(c)))
            .map(|(&id, _)| id)
            .sorted_unstable()
            .collect()
    }

    // --- interfaces ----------------------------------------------------------

    /// True once the interface cache has been built for the current topology.
    pub fn are_interfaces_built(&self) -> bool {
        self.interfaces.get().is_some()
    }

    /// The interface set, built on first demand.
    ///
    /// Interface ids are assigned deterministically: cells are visited in
    /// ascending id order, edges in connectivity order, and each first-seen
    /// edge takes the next id starting from 1 (interfaces have their own id
    /// space).
    pub fn interfaces(&self) -> &HashMap<ElementId, Interface> {
        self.interfaces.get_or_init(|| self.build_interfaces())
    }

    /// All interface ids, ascending. Builds the cache on demand.
    pub fn interface_ids(&self) -> Vec<ElementId> {
        self.interfaces()
            .keys()
            .copied()
            .sorted_unstable()
            .collect()
    }

    pub fn interface_count(&self) -> usize {
        self.interfaces().len()
    }

    fn build_interfaces(&self) -> HashMap<ElementId, Interface> {
        let mut by_edge: HashMap<(ElementId, ElementId), ElementId> = HashMap::new();
        let mut out: HashMap<ElementId, Interface> = HashMap::new();
        let mut next = 1u64;
        for cell_id in self.cell_ids() {
            let cell = &self.cells[&cell_id];
            let n = cell.connectivity.len();
            for k in 0..n {
                let a = cell.connectivity[k];
                let b = cell.connectivity[(k + 1) % n];
                let key = if a <= b { (a, b) } else { (b, a) };
                let itf_id = *by_edge.entry(key).or_insert_with(|| {
                    let id = ElementId::new(next);
                    next += 1;
                    out.insert(
                        id,
                        Interface {
                            vertices: [key.0, key.1],
                            cells: Vec::new(),
                        },
                    );
                    id
                });
                if let Some(itf) = out.get_mut(&itf_id) {
                    if !itf.cells.contains(&cell_id) {
                        itf.cells.push(cell_id);
                    }
                }
            }
        }
        out
    }

    // --- bounding boxes and the spatial index --------------------------------

    /// Bounding box of one cell.
    pub fn cell_bbox(&self, id: ElementId) -> Option<Aabb> {
        let cell = self.cells.get(&id)?;
        Some(Aabb::from_points(
            cell.connectivity
                .iter()
                .filter_map(|v| self.vertices.get(v))
                .copied(),
        ))
    }

    /// Bounding box of the whole mesh.
    pub fn bbox(&self) -> Aabb {
        Aabb::from_points(self.vertices.values().copied())
    }

    /// True once the skd-tree is built and in sync with the current topology.
    pub fn is_skd_synced(&self) -> bool {
        self.skd.get().is_some()
    }

    /// The skd-tree over the mesh's cells, built on first demand.
    pub fn skd_tree(&self) -> Arc<SkdTree> {
        self.skd
            .get_or_init(|| {
                let items = self
                    .cell_ids()
                    .into_iter()
                    .filter_map(|id| self.cell_bbox(id).map(|b| (id, b)))
                    .collect();
                Arc::new(SkdTree::build(items))
            })
            .clone()
    }
}
