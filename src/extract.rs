//! Extraction engine: relocate a vector field onto another mesh.
//!
//! Given a field defined over a source geometry and an independently indexed
//! target geometry, [`extract`] computes the restriction/relocation of the
//! field valid on the target, at a caller-selected location, using one of
//! three correspondence strategies:
//!
//! - **Id**: direct identifier lookup; the id spaces must already coincide.
//! - **Pid**: restrict by region tag; only tags present on *both* geometries
//!   survive. The result stays attached to the source geometry, since region
//!   restriction does not reproject coordinates.
//! - **Mapping**: geometric correspondence through the skd-trees; every
//!   target cell whose bounding box lies within `tol` of the source patch is
//!   selected (patch overlap, not nearest-cell).
//!
//! Extraction is commonly attempted speculatively, so failures come back as
//! an error value rather than a panic, and values for elements absent from
//! the input are never defaulted to zero.

use std::sync::Arc;

use thiserror::Error;

use crate::data::field::{FieldLocation, VectorField};
use crate::geometry::mesh::MeshPatch;
use crate::geometry::skd_tree::select_by_patch;
use crate::topology::element::ElementId;

/// Correspondence strategy for field extraction.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum ExtractMode {
    /// Direct identifier match; O(n) lookup, no geometric reasoning.
    Id,
    /// Region-tag (PID) restriction on the source geometry.
    Pid,
    /// Spatial correspondence via skd-tree patch overlap within a tolerance.
    Mapping,
}

/// Failure modes of [`extract`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The source field's weak geometry reference is dead.
    #[error("source field's geometry reference is unavailable")]
    SourceGeometryUnavailable,
    /// The source field failed identifier-coherence validation.
    #[error("source field is incoherent with its geometry")]
    IncoherentField,
    /// A defined location (point, cell, or interface) is required.
    #[error("extraction location is undefined")]
    UndefinedLocation,
    /// The extraction selected no values.
    #[error("extraction produced an empty field")]
    EmptyResult,
}

/// Extracts `field` onto `target` with the given strategy, location, and
/// tolerance (`tol` only matters for [`ExtractMode::Mapping`]).
///
/// The result's location tag equals `location`, and its geometry reference
/// is the target (Id/Mapping) or the field's source geometry (Pid).
pub fn extract(
    field: &VectorField,
    target: &Arc<MeshPatch>,
    mode: ExtractMode,
    location: FieldLocation,
    tol: f64,
) -> Result<VectorField, ExtractionError> {
    if location == FieldLocation::Undefined {
        return Err(ExtractionError::UndefinedLocation);
    }
    let source = field
        .geometry()
        .ok_or(ExtractionError::SourceGeometryUnavailable)?;
    if !field.check_id_coherence() {
        return Err(ExtractionError::IncoherentField);
    }

    let mut result = VectorField::new(location);
    match mode {
        ExtractMode::Id => {
            let ids = element_ids(target, location);
            copy_existing(field, &ids, &mut result);
            result.set_geometry(target);
        }
        ExtractMode::Pid => {
            let common = common_region_tags(target, &source);
            let cells = source.cells_with_regions(&common);
            let ids = derive_ids(&source, &cells, location);
            copy_existing(field, &ids, &mut result);
            result.set_geometry(&source);
        }
        ExtractMode::Mapping => {
            // Target cells whose boxes lie within tol of the source patch;
            // derivation then runs in the target's id space.
            let cells = select_by_patch(&target.skd_tree(), &source.skd_tree(), tol);
            let ids = derive_ids(target, &cells, location);
            copy_existing(field, &ids, &mut result);
            result.set_geometry(target);
        }
    }

    if result.is_empty() {
        return Err(ExtractionError::EmptyResult);
    }
    Ok(result)
}

/// Region tags present on both geometries, ascending.
fn common_region_tags(target: &Arc<MeshPatch>, source: &Arc<MeshPatch>) -> Vec<i32> {
    let source_tags = source.region_tags();
    target
        .region_tags()
        .into_iter()
        .filter(|tag| source_tags.binary_search(tag).is_ok())
        .collect()
}

/// The geometry's full element id set at `location`.
fn element_ids(geom: &MeshPatch, location: FieldLocation) -> Vec<ElementId> {
    match location {
        FieldLocation::Point => geom.vertex_ids(),
        FieldLocation::Cell => geom.cell_ids(),
        FieldLocation::Interface => geom.interface_ids(),
        FieldLocation::Undefined => Vec::new(),
    }
}

/// Ids induced by a cell set at `location`: the cells themselves, their
/// vertices, or their adjacent interfaces.
fn derive_ids(geom: &MeshPatch, cells: &[ElementId], location: FieldLocation) -> Vec<ElementId> {
    match location {
        FieldLocation::Point => geom.vertices_of_cells(cells),
        FieldLocation::Cell => cells.to_vec(),
        FieldLocation::Interface => geom.interfaces_of_cells(cells),
        FieldLocation::Undefined => Vec::new(),
    }
}

fn copy_existing(field: &VectorField, ids: &[ElementId], result: &mut VectorField) {
    for &id in ids {
        if let Some(value) = field.get(id) {
            result.insert(id, value);
        }
    }
}
