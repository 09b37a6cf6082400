//! Extraction-engine behavior across the three correspondence strategies.

use std::sync::Arc;

use mesh_chain::prelude::*;

fn id(raw: u64) -> ElementId {
    ElementId::new(raw)
}

/// An `nx` x `ny` quad grid in the z=0 plane. Vertex and cell ids start at
/// `base + 1`; the grid is shifted by `origin` and every cell carries
/// `region`.
fn quad_grid(nx: u64, ny: u64, base: u64, origin: [f64; 3], region: i32) -> MeshPatch {
    let mut m = MeshPatch::new();
    let vid = |i: u64, j: u64| id(base + j * (nx + 1) + i + 1);
    for j in 0..=ny {
        for i in 0..=nx {
            m.add_vertex(
                vid(i, j),
                [
                    origin[0] + i as f64,
                    origin[1] + j as f64,
                    origin[2],
                ],
            )
            .unwrap();
        }
    }
    for j in 0..ny {
        for i in 0..nx {
            let cid = id(base + j * nx + i + 1);
            m.add_cell(
                cid,
                vec![vid(i, j), vid(i + 1, j), vid(i + 1, j + 1), vid(i, j + 1)],
                region,
            )
            .unwrap();
        }
    }
    m
}

fn cell_field(mesh: &Arc<MeshPatch>) -> VectorField {
    let mut f = VectorField::on_geometry(mesh, FieldLocation::Cell);
    for cid in mesh.cell_ids() {
        f.insert(cid, [cid.get() as f64, 0.0, 0.0]);
    }
    f
}

fn point_field(mesh: &Arc<MeshPatch>) -> VectorField {
    let mut f = VectorField::on_geometry(mesh, FieldLocation::Point);
    for vid in mesh.vertex_ids() {
        f.insert(vid, [0.0, vid.get() as f64, 0.0]);
    }
    f
}

/// Extracting an already-extracted field again, same target and strategy,
/// changes nothing.
#[test]
fn id_extraction_is_idempotent() {
    let mesh = Arc::new(quad_grid(2, 2, 0, [0.0; 3], 0));
    let field = point_field(&mesh);
    let once = extract(&field, &mesh, ExtractMode::Id, FieldLocation::Point, 0.0).unwrap();
    let twice = extract(&once, &mesh, ExtractMode::Id, FieldLocation::Point, 0.0).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once.ids(), mesh.vertex_ids());
}

/// Values absent from the input stay absent in the output.
#[test]
fn id_extraction_never_zero_fills() {
    let mesh = Arc::new(quad_grid(2, 2, 0, [0.0; 3], 0));
    let mut field = VectorField::on_geometry(&mesh, FieldLocation::Cell);
    field.insert(id(1), [3.0, 0.0, 0.0]);
    let out = extract(&field, &mesh, ExtractMode::Id, FieldLocation::Cell, 0.0).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out.get(id(1)), Some([3.0, 0.0, 0.0]));
    assert_eq!(out.get(id(2)), None);
}

/// Only region tags present on both geometries survive a PID extraction,
/// and the result stays attached to the source geometry.
#[test]
fn pid_extraction_intersects_region_tags() {
    // source: 4x1 strip, left half region 1, right half region 2
    let mut source = quad_grid(4, 1, 0, [0.0; 3], 1);
    source.set_region(id(3), 2).unwrap();
    source.set_region(id(4), 2).unwrap();
    let source = Arc::new(source);
    let field = cell_field(&source);

    // target shares only region 2
    let target = Arc::new(quad_grid(1, 1, 100, [10.0, 0.0, 0.0], 2));

    let out = extract(&field, &target, ExtractMode::Pid, FieldLocation::Cell, 0.0).unwrap();
    assert_eq!(out.ids(), vec![id(3), id(4)]);
    assert!(Arc::ptr_eq(&out.geometry().unwrap(), &source));

    // no shared tag at all: nothing is selected
    let stranger = Arc::new(quad_grid(1, 1, 200, [20.0, 0.0, 0.0], 9));
    assert_eq!(
        extract(&field, &stranger, ExtractMode::Pid, FieldLocation::Cell, 0.0),
        Err(ExtractionError::EmptyResult)
    );
}

/// PID at POINT location yields the vertices of the tag-selected cells.
#[test]
fn pid_extraction_derives_points_from_selected_cells() {
    let mut source = quad_grid(2, 1, 0, [0.0; 3], 1);
    source.set_region(id(2), 2).unwrap();
    let source = Arc::new(source);
    let field = point_field(&source);
    let target = Arc::new(quad_grid(1, 1, 100, [10.0, 0.0, 0.0], 2));

    let out = extract(&field, &target, ExtractMode::Pid, FieldLocation::Point, 0.0).unwrap();
    assert_eq!(out.ids(), source.vertices_of_cells(&[id(2)]));
}

/// Two geometries occupying the same space: zero tolerance selects every
/// coincident cell, and the result attaches to the target.
#[test]
fn mapping_zero_tolerance_selects_coincident_cells() {
    let source = Arc::new(quad_grid(2, 2, 0, [0.0; 3], 0));
    let target = Arc::new(quad_grid(2, 2, 0, [0.0; 3], 0));
    let field = cell_field(&source);

    let out = extract(&field, &target, ExtractMode::Mapping, FieldLocation::Cell, 0.0).unwrap();
    assert_eq!(out.ids(), target.cell_ids());
    assert!(Arc::ptr_eq(&out.geometry().unwrap(), &target));
}

/// Disjoint patches with a tolerance smaller than the gap select nothing;
/// a tolerance spanning the gap brings the near column in.
#[test]
fn mapping_tolerance_bridges_gaps() {
    // target cell 1 sits at x in [0,1]; the source patch starts at x = 2.5
    let target = Arc::new(quad_grid(1, 1, 0, [0.0; 3], 0));
    let source = Arc::new(quad_grid(1, 1, 0, [2.5, 0.0, 0.0], 0));
    let field = cell_field(&source);

    assert_eq!(
        extract(&field, &target, ExtractMode::Mapping, FieldLocation::Cell, 0.1),
        Err(ExtractionError::EmptyResult)
    );
    let out =
        extract(&field, &target, ExtractMode::Mapping, FieldLocation::Cell, 2.0).unwrap();
    assert_eq!(out.ids(), vec![id(1)]);
}

/// Cell extraction followed by vertex derivation names exactly the ids a
/// direct point extraction names.
#[test]
fn cell_then_points_matches_direct_point_extraction() {
    let mesh = Arc::new(quad_grid(3, 2, 0, [0.0; 3], 0));
    let cells = cell_field(&mesh);
    let points = point_field(&mesh);

    let by_cell = extract(&cells, &mesh, ExtractMode::Id, FieldLocation::Cell, 0.0).unwrap();
    let derived = mesh.vertices_of_cells(&by_cell.ids());

    let direct = extract(&points, &mesh, ExtractMode::Id, FieldLocation::Point, 0.0).unwrap();
    assert_eq!(derived, direct.ids());
}

/// Interface-located extraction builds the interface set on demand.
#[test]
fn interface_extraction_uses_lazy_interfaces() {
    let mesh = Arc::new(quad_grid(2, 1, 0, [0.0; 3], 0));
    let mut field = VectorField::on_geometry(&mesh, FieldLocation::Interface);
    for iid in mesh.interface_ids() {
        field.insert(iid, [1.0, 0.0, 0.0]);
    }
    let out = extract(&field, &mesh, ExtractMode::Id, FieldLocation::Interface, 0.0).unwrap();
    assert_eq!(out.ids(), mesh.interface_ids());
    assert_eq!(out.location(), FieldLocation::Interface);
}

/// The extractor block defaults its location to the incoming field's and
/// wires cleanly into a chain.
#[test]
fn extractor_block_defaults_to_field_location() {
    let mesh = Arc::new(quad_grid(2, 2, 0, [0.0; 3], 0));
    let field = Arc::new(cell_field(&mesh));

    let mut reg = BlockRegistry::new();
    let geom = reg.add(Box::new(GeometrySource::with_geometry("geom", mesh.clone())));
    let fsrc = reg.add(Box::new(FieldSource::with_field("field", field)));
    let extr = reg.add(Box::new(ExtractVectorField::new("extract", ExtractMode::Id)));
    let sink = reg.add(Box::new(FieldSink::new("sink")));
    reg.connect(geom, PortTag::Geometry, extr, PortTag::Geometry)
        .unwrap();
    reg.connect(fsrc, PortTag::VectorField, extr, PortTag::VectorField)
        .unwrap();
    reg.connect(extr, PortTag::VectorField, sink, PortTag::VectorField)
        .unwrap();

    let mut chain = Chain::new();
    for key in [geom, fsrc, extr, sink] {
        chain.add(key);
    }
    chain.execute(&mut reg, false).unwrap();

    let sink = reg.downcast::<FieldSink>(sink).unwrap();
    let received = sink.received().unwrap();
    assert_eq!(received.location(), FieldLocation::Cell);
    assert_eq!(received.ids(), mesh.cell_ids());
}
