//! Voxel-grid downsampling.

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use scan_types::PointCloud;
use tracing::info;

use crate::{ReconstructError, ReconstructResult};

/// Integer coordinates of a voxel cell.
pub type VoxelKey = (i64, i64, i64);

/// The voxel containing `point` for a grid of cell size `voxel_size`.
///
/// Cells are half-open: a coordinate exactly on a cell boundary belongs to
/// the cell above it.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn voxel_key(point: &Point3<f64>, voxel_size: f64) -> VoxelKey {
    (
        (point.x / voxel_size).floor() as i64,
        (point.y / voxel_size).floor() as i64,
        (point.z / voxel_size).floor() as i64,
    )
}

#[derive(Debug, Clone, Copy)]
struct VoxelAccum {
    position: Vector3<f64>,
    color: Vector3<f64>,
    count: u64,
}

impl VoxelAccum {
    #[allow(clippy::cast_precision_loss)]
    fn mean(&self) -> (Point3<f64>, Vector3<f64>) {
        let n = self.count as f64;
        (Point3::from(self.position / n), self.color / n)
    }
}

/// Reduce a cloud to one sample per occupied voxel.
///
/// Each output point is the mean position and mean color of the input points
/// sharing its voxel. Output order follows the first occurrence of each voxel
/// in the input, so the result does not depend on how the input was chunked.
///
/// The input cloud is consumed; its buffers are freed before this returns.
///
/// # Errors
///
/// Returns [`ReconstructError::InvalidVoxelSize`] if `voxel_size` is not
/// finite and positive.
///
/// # Example
///
/// ```
/// use scan_reconstruct::voxel_downsample;
/// use scan_types::{PointCloud, PointRecord};
///
/// let cloud: PointCloud = [
///     PointRecord::from_raw(0.0, 0.0, 0.0, 255, 0, 0),
///     PointRecord::from_raw(1.0, 0.0, 0.0, 0, 255, 0),
///     PointRecord::from_raw(0.0, 1.0, 0.0, 0, 0, 255),
///     PointRecord::from_raw(1.0, 1.0, 0.0, 255, 255, 0),
/// ]
/// .into_iter()
/// .collect();
///
/// let down = voxel_downsample(cloud, 2.0).unwrap();
/// assert_eq!(down.len(), 1);
/// assert!((down.positions()[0].x - 0.5).abs() < 1e-12);
/// assert!((down.colors()[0].z - 0.25).abs() < 1e-12);
/// ```
pub fn voxel_downsample(cloud: PointCloud, voxel_size: f64) -> ReconstructResult<PointCloud> {
    if !voxel_size.is_finite() || voxel_size <= 0.0 {
        return Err(ReconstructError::InvalidVoxelSize(voxel_size));
    }

    let input_len = cloud.len();
    let (positions, colors) = cloud.into_parts();

    let mut slots: HashMap<VoxelKey, usize> = HashMap::new();
    let mut voxels: Vec<VoxelAccum> = Vec::new();

    for (position, color) in positions.iter().zip(&colors) {
        let key = voxel_key(position, voxel_size);
        let slot = *slots.entry(key).or_insert_with(|| {
            voxels.push(VoxelAccum {
                position: Vector3::zeros(),
                color: Vector3::zeros(),
                count: 0,
            });
            voxels.len() - 1
        });
        let acc = &mut voxels[slot];
        acc.position += position.coords;
        acc.color += color;
        acc.count += 1;
    }
    drop(slots);
    drop(positions);
    drop(colors);

    let mut out = PointCloud::with_capacity(voxels.len());
    for acc in voxels {
        let (position, color) = acc.mean();
        out.push_normalized(position, color);
    }

    info!(
        input = input_len,
        output = out.len(),
        voxel_size,
        "voxel downsample"
    );

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use scan_types::PointRecord;

    fn square() -> PointCloud {
        [
            PointRecord::from_raw(0.0, 0.0, 0.0, 255, 0, 0),
            PointRecord::from_raw(1.0, 0.0, 0.0, 0, 255, 0),
            PointRecord::from_raw(0.0, 1.0, 0.0, 0, 0, 255),
            PointRecord::from_raw(1.0, 1.0, 0.0, 255, 255, 0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn rejects_bad_voxel_size() {
        for v in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                voxel_downsample(square(), v),
                Err(ReconstructError::InvalidVoxelSize(_))
            ));
        }
    }

    #[test]
    fn single_voxel_mean() {
        let down = voxel_downsample(square(), 2.0).unwrap();
        assert_eq!(down.len(), 1);

        let p = down.positions()[0];
        assert_relative_eq!(p.x, 0.5);
        assert_relative_eq!(p.y, 0.5);
        assert_relative_eq!(p.z, 0.0);

        let c = down.colors()[0];
        assert_relative_eq!(c.x, 0.5);
        assert_relative_eq!(c.y, 0.5);
        assert_relative_eq!(c.z, 0.25);
    }

    #[test]
    fn crowded_voxel_mean_beyond_u32_count() {
        let count = u64::from(u32::MAX) + 10;
        #[allow(clippy::cast_precision_loss)]
        let n = count as f64;
        let acc = VoxelAccum {
            position: Vector3::new(2.0, -1.0, 0.5) * n,
            color: Vector3::new(0.5, 0.25, 1.0) * n,
            count,
        };

        let (p, c) = acc.mean();
        assert_relative_eq!(p, Point3::new(2.0, -1.0, 0.5), epsilon = 1e-9);
        assert_relative_eq!(c, Vector3::new(0.5, 0.25, 1.0), epsilon = 1e-9);
    }

    #[test]
    fn small_voxels_keep_every_point() {
        let down = voxel_downsample(square(), 0.5).unwrap();
        assert_eq!(down, square());
    }

    #[test]
    fn output_follows_first_occurrence() {
        let cloud = PointCloud::from_positions(vec![
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(0.1, 0.0, 0.0),
            Point3::new(5.2, 0.0, 0.0),
        ]);
        let down = voxel_downsample(cloud, 1.0).unwrap();
        assert_eq!(down.len(), 2);
        assert_relative_eq!(down.positions()[0].x, 5.1);
        assert_relative_eq!(down.positions()[1].x, 0.1);
    }

    #[test]
    fn negative_coordinates_floor_down() {
        assert_eq!(voxel_key(&Point3::new(-0.1, 0.0, 1.0), 1.0), (-1, 0, 1));
        assert_eq!(voxel_key(&Point3::new(2.0, -2.0, 0.99), 1.0), (2, -2, 0));
    }

    #[test]
    fn empty_cloud_stays_empty() {
        let down = voxel_downsample(PointCloud::new(), 0.1).unwrap();
        assert!(down.is_empty());
    }
}
