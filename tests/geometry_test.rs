use cgmath::{InnerSpace, Vector3};
use firefly_grove::data_structures::geometry::MeshData;

fn v(a: [f32; 3]) -> Vector3<f32> {
    Vector3::from(a)
}

/// Every triangle winds counter-clockwise as seen from outside a convex
/// shape centred on the origin, and agrees with its vertex normals.
fn assert_outward(name: &str, mesh: &MeshData) {
    assert_eq!(mesh.indices.len() % 3, 0, "{name}");
    for triangle in mesh.indices.chunks(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| &mesh.vertices[i as usize]);
        let face = (v(b.position) - v(a.position)).cross(v(c.position) - v(a.position));
        if face.magnitude2() < 1e-12 {
            continue;
        }
        let centroid = (v(a.position) + v(b.position) + v(c.position)) / 3.0;
        assert!(face.dot(centroid) > 0.0, "{name}: inward triangle {triangle:?}");
        let normals = v(a.normal) + v(b.normal) + v(c.normal);
        assert!(face.dot(normals) > 0.0, "{name}: normals disagree with {triangle:?}");
    }
}

fn assert_unit_normals(name: &str, mesh: &MeshData) {
    for vertex in &mesh.vertices {
        let length = v(vertex.normal).magnitude();
        assert!((length - 1.0).abs() < 1e-5, "{name}: normal of length {length}");
    }
}

fn assert_indices_in_range(name: &str, mesh: &MeshData) {
    let count = mesh.vertices.len() as u32;
    assert!(mesh.indices.iter().all(|i| *i < count), "{name}");
}

#[test]
fn should_build_an_outward_cuboid() {
    let cube = MeshData::cuboid(5.0, 5.0, 5.0);
    assert_eq!(cube.vertices.len(), 24);
    assert_eq!(cube.triangle_count(), 12);
    assert_outward("cuboid", &cube);
    assert_unit_normals("cuboid", &cube);
    assert_indices_in_range("cuboid", &cube);
    for vertex in &cube.vertices {
        assert!(vertex.position.iter().all(|c| c.abs() == 2.5));
    }
}

#[test]
fn should_build_an_outward_sphere() {
    let sphere = MeshData::sphere(2.0, 10, 10);
    assert_eq!(sphere.vertices.len(), 11 * 11);
    // the pole rows drop one triangle of each quad
    assert_eq!(sphere.triangle_count(), 10 * 10 * 2 - 2 * 10);
    assert_outward("sphere", &sphere);
    assert_unit_normals("sphere", &sphere);
    assert_indices_in_range("sphere", &sphere);
    for vertex in &sphere.vertices {
        assert!((v(vertex.position).magnitude() - 2.0).abs() < 1e-5);
    }
}

#[test]
fn should_build_a_closed_outward_cylinder() {
    let cylinder = MeshData::cylinder(2.0, 2.0, 10.0, 32);
    assert_eq!(cylinder.triangle_count(), 32 * 2 + 32 * 2);
    assert_outward("cylinder", &cylinder);
    assert_unit_normals("cylinder", &cylinder);
    assert_indices_in_range("cylinder", &cylinder);
    let heights: Vec<f32> = cylinder.vertices.iter().map(|v| v.position[1]).collect();
    assert!(heights.iter().all(|y| y.abs() <= 5.0));
    assert!(heights.contains(&5.0) && heights.contains(&-5.0));
}

#[test]
fn should_face_the_plane_towards_z() {
    let plane = MeshData::plane(150.0, 150.0);
    assert_eq!(plane.triangle_count(), 2);
    assert_unit_normals("plane", &plane);
    for triangle in plane.indices.chunks(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| v(plane.vertices[i as usize].position));
        assert!((b - a).cross(c - a).z > 0.0);
    }
    for vertex in &plane.vertices {
        assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        assert!(vertex.position[0].abs() == 75.0 && vertex.position[1].abs() == 75.0);
    }
}

#[test]
fn should_raise_degenerate_segment_counts() {
    let sphere = MeshData::sphere(1.0, 0, 0);
    assert_eq!(sphere.vertices.len(), 4 * 3);
    let cylinder = MeshData::cylinder(1.0, 1.0, 1.0, 1);
    assert_eq!(cylinder.triangle_count(), 3 * 4);
}
