//! Chunk concatenation.

use std::fmt;

use scan_types::{Centroid, PointCloud};
use tracing::{debug, info};

use crate::{IngestError, IngestResult};

/// Counters describing one assembly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    /// Chunks consumed.
    pub chunks: usize,
    /// Points in the assembled cloud.
    pub points: usize,
    /// Size of the largest chunk seen.
    pub largest_chunk: usize,
}

/// A fully assembled cloud and its centroid.
#[derive(Debug, Clone)]
pub struct AssembledCloud {
    /// Every record of the stream, in stream order.
    pub cloud: PointCloud,
    /// Mean of all positions.
    pub centroid: Centroid,
    /// Assembly counters.
    pub stats: AssemblyStats,
}

impl fmt::Display for AssembledCloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} points from {} chunks, {}",
            self.stats.points, self.stats.chunks, self.centroid
        )
    }
}

/// Concatenate chunks into a single cloud.
///
/// Chunks are appended in order and each one is dropped as soon as its
/// points have been moved, so peak memory is the full cloud plus one chunk.
///
/// # Errors
///
/// Returns the first `Err` chunk unchanged, or [`IngestError::EmptyCloud`]
/// if no points were produced.
pub fn assemble<I>(chunks: I) -> IngestResult<AssembledCloud>
where
    I: IntoIterator<Item = IngestResult<PointCloud>>,
{
    let mut cloud = PointCloud::new();
    let mut stats = AssemblyStats::default();

    for chunk in chunks {
        let chunk = chunk?;
        stats.chunks += 1;
        stats.largest_chunk = stats.largest_chunk.max(chunk.len());
        debug!(chunk = stats.chunks, points = chunk.len(), "appending chunk");
        cloud.append(chunk);
    }

    let centroid = cloud.centroid().ok_or(IngestError::EmptyCloud)?;
    stats.points = cloud.len();
    info!(points = stats.points, chunks = stats.chunks, %centroid, "assembled cloud");

    Ok(AssembledCloud {
        cloud,
        centroid,
        stats,
    })
}
