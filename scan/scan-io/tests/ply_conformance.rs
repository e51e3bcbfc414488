//! Conformance tests for the PLY writers on scan-sized outputs.
//!
//! To run: cargo test -p scan-io ply

use scan_io::{load_mesh_ply, load_point_cloud_ply, save_mesh_ply, save_point_cloud_ply};
use scan_types::{Point3, PointCloud, PointRecord, TriangleMesh};
use tempfile::tempdir;

/// Wavy height field with `n x n` cells.
fn terrain(n: u32) -> TriangleMesh {
    let w = n + 1;
    let mut vertices = Vec::new();
    for z in 0..w {
        for x in 0..w {
            let (fx, fz) = (f64::from(x) * 0.1, f64::from(z) * 0.1);
            vertices.push(Point3::new(fx, (fx * 3.0).sin() * (fz * 2.0).cos() * 0.2, fz));
        }
    }
    let mut triangles = Vec::new();
    for z in 0..n {
        for x in 0..n {
            let i = z * w + x;
            triangles.push([i, i + w, i + 1]);
            triangles.push([i + 1, i + w, i + w + 1]);
        }
    }
    let mut mesh = TriangleMesh::from_parts(vertices, triangles);
    mesh.compute_vertex_normals();
    mesh
}

fn rainbow_cloud(n: u32) -> PointCloud {
    (0..n)
        .map(|i| {
            let t = f64::from(i);
            #[allow(clippy::cast_possible_truncation)]
            let c = (i % 256) as u8;
            PointRecord::from_raw(t.cos() * 5.0, t * 0.01, t.sin() * 5.0, c, 255 - c, c / 2)
        })
        .collect()
}

#[test]
fn ply_binary_and_ascii_agree_for_meshes() {
    let dir = tempdir().unwrap();
    let mesh = terrain(40);

    let binary = dir.path().join("binary.ply");
    let ascii = dir.path().join("ascii.ply");
    save_mesh_ply(&mesh, &binary, true).unwrap();
    save_mesh_ply(&mesh, &ascii, false).unwrap();

    let a = load_mesh_ply(&binary).unwrap();
    let b = load_mesh_ply(&ascii).unwrap();

    assert_eq!(a.triangle_count(), 3200);
    assert_eq!(a.triangles, b.triangles);
    for (p, q) in a.vertices.iter().zip(&b.vertices) {
        assert!((p - q).norm() < 1e-5);
    }
    assert!(a.has_normals() && b.has_normals());

    let binary_size = std::fs::metadata(&binary).unwrap().len();
    let ascii_size = std::fs::metadata(&ascii).unwrap().len();
    assert!(binary_size < ascii_size);
}

#[test]
fn ply_cloud_preserves_order_and_colors() {
    let dir = tempdir().unwrap();
    let cloud = rainbow_cloud(1000);
    let path = dir.path().join("output_cloud.ply");

    save_point_cloud_ply(&cloud, &path, true).unwrap();
    let loaded = load_point_cloud_ply(&path).unwrap();

    assert_eq!(loaded.len(), cloud.len());
    assert_eq!(loaded.colors(), cloud.colors());
    for (p, q) in loaded.positions().iter().zip(cloud.positions()) {
        assert!((p - q).norm() < 1e-5);
    }
}

#[test]
fn ply_overwrites_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mesh.ply");

    save_mesh_ply(&terrain(10), &path, true).unwrap();
    save_mesh_ply(&terrain(2), &path, true).unwrap();

    assert_eq!(load_mesh_ply(&path).unwrap().triangle_count(), 8);
}

#[test]
fn ply_keeps_georeferenced_precision() {
    let dir = tempdir().unwrap();
    let cloud: PointCloud = [0.0, 0.05, 0.10]
        .into_iter()
        .map(|dy| PointRecord::from_raw(512_345.25, 4_100_000.0 + dy, 37.5, 10, 20, 30))
        .collect();
    let mesh = TriangleMesh::from_parts(cloud.positions().to_vec(), vec![[0, 1, 2]]);

    for binary in [true, false] {
        let cloud_path = dir.path().join(format!("cloud_{binary}.ply"));
        save_point_cloud_ply(&cloud, &cloud_path, binary).unwrap();
        let loaded = load_point_cloud_ply(&cloud_path).unwrap();
        assert_eq!(loaded.positions(), cloud.positions(), "binary = {binary}");

        let mesh_path = dir.path().join(format!("mesh_{binary}.ply"));
        save_mesh_ply(&mesh, &mesh_path, binary).unwrap();
        let loaded = load_mesh_ply(&mesh_path).unwrap();
        assert_eq!(loaded.vertices, mesh.vertices, "binary = {binary}");
    }
}
