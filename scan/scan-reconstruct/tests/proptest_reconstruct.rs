//! Property-based tests for downsampling and reconstruction.
//!
//! Run with: cargo test -p scan-reconstruct -- proptest

use hashbrown::HashMap;
use proptest::prelude::*;
use scan_reconstruct::{AlphaParams, reconstruct_or_empty, voxel_downsample, voxel_key};
use scan_types::{Point3, PointCloud, PointRecord, Vector3};

// =============================================================================
// Strategies
// =============================================================================

fn arb_record() -> impl Strategy<Value = PointRecord> {
    (
        prop::array::uniform3(-10.0..10.0f64),
        prop::array::uniform3(any::<u8>()),
    )
        .prop_map(|([x, y, z], [r, g, b])| PointRecord::from_raw(x, y, z, r, g, b))
}

fn arb_cloud(max: usize) -> impl Strategy<Value = PointCloud> {
    prop::collection::vec(arb_record(), 0..max).prop_map(|v| v.into_iter().collect())
}

fn arb_voxel() -> impl Strategy<Value = f64> {
    0.05..5.0f64
}

/// Source indices of each occupied voxel, in first-occurrence order.
fn group_by_voxel(cloud: &PointCloud, v: f64) -> Vec<Vec<usize>> {
    let mut slots = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, p) in cloud.positions().iter().enumerate() {
        let slot = *slots.entry(voxel_key(p, v)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(i);
    }
    groups
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn downsample_never_grows(cloud in arb_cloud(300), v in arb_voxel()) {
        let n = cloud.len();
        let down = voxel_downsample(cloud, v).unwrap();
        prop_assert!(down.len() <= n);
        prop_assert_eq!(down.positions().len(), down.colors().len());
    }

    #[test]
    fn each_output_point_is_its_voxel_mean(cloud in arb_cloud(300), v in arb_voxel()) {
        let groups = group_by_voxel(&cloud, v);
        let down = voxel_downsample(cloud.clone(), v).unwrap();

        prop_assert_eq!(down.len(), groups.len());

        for (slot, members) in groups.iter().enumerate() {
            let positions: Vec<_> = members.iter().map(|&i| cloud.positions()[i]).collect();
            for axis in 0..3 {
                let lo = positions.iter().map(|p| p[axis]).fold(f64::INFINITY, f64::min);
                let hi = positions.iter().map(|p| p[axis]).fold(f64::NEG_INFINITY, f64::max);
                prop_assert!(
                    hi - lo < v * (1.0 + 1e-12),
                    "axis {} spread {} >= {}",
                    axis,
                    hi - lo,
                    v
                );
            }

            #[allow(clippy::cast_precision_loss)]
            let n = members.len() as f64;
            let mean_position: Vector3<f64> =
                positions.iter().map(|p| p.coords).sum::<Vector3<f64>>() / n;
            let mean_color: Vector3<f64> =
                members.iter().map(|&i| cloud.colors()[i]).sum::<Vector3<f64>>() / n;

            prop_assert!((down.positions()[slot].coords - mean_position).norm() < 1e-9);
            prop_assert!((down.colors()[slot] - mean_color).norm() < 1e-9);
        }
    }

    #[test]
    fn downsample_is_deterministic(cloud in arb_cloud(200), v in arb_voxel()) {
        let a = voxel_downsample(cloud.clone(), v).unwrap();
        let b = voxel_downsample(cloud, v).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn colors_stay_normalized(cloud in arb_cloud(200), v in arb_voxel()) {
        let down = voxel_downsample(cloud, v).unwrap();
        for c in down.colors() {
            prop_assert!(c.iter().all(|x| (-1e-12..=1.0 + 1e-12).contains(x)));
        }
    }

    #[test]
    fn tiny_clouds_reconstruct_to_empty(cloud in arb_cloud(4)) {
        prop_assume!(cloud.len() < 4);
        let mesh = reconstruct_or_empty(&cloud, &AlphaParams::default()).unwrap();
        prop_assert!(mesh.is_empty());
    }

    #[test]
    fn reconstructed_meshes_are_valid(cloud in arb_cloud(60), alpha in 1.0..20.0f64) {
        let mesh = reconstruct_or_empty(&cloud, &AlphaParams::new(alpha)).unwrap();
        prop_assert!(mesh.validate().is_ok());
        prop_assert!(mesh.vertex_count() <= cloud.len());
    }
}

#[test]
fn voxels_are_floor_aligned_cells() {
    let cloud: PointCloud = [
        PointRecord::from_raw(0.9, 0.0, 0.0, 0, 0, 0),
        PointRecord::from_raw(1.1, 0.0, 0.0, 255, 255, 255),
        PointRecord::from_raw(2.0, 0.0, 0.0, 0, 0, 0),
        PointRecord::from_raw(-0.1, 0.0, 0.0, 0, 0, 0),
    ]
    .into_iter()
    .collect();

    let down = voxel_downsample(cloud, 2.0).unwrap();

    // [0, 2) holds 0.9 and 1.1; 2.0 starts the next cell; -0.1 the previous
    assert_eq!(down.len(), 3);
    assert!((down.positions()[0].x - 1.0).abs() < 1e-12);
    assert!((down.colors()[0].x - 0.5).abs() < 1e-12);
    assert!((down.positions()[1].x - 2.0).abs() < 1e-12);
    assert!((down.positions()[2].x + 0.1).abs() < 1e-12);
}

#[test]
fn planar_cloud_reconstructs_to_empty() {
    let cloud = PointCloud::from_positions(
        (0..50)
            .map(|i| Point3::new(f64::from(i % 7), 1.5, f64::from(i / 7)))
            .collect(),
    );
    let mesh = reconstruct_or_empty(&cloud, &AlphaParams::new(5.0)).unwrap();
    assert!(mesh.is_empty());
}
