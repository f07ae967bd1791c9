//! Satellite trails
//!
//! A trail remembers the last N positions of its satellite in a fixed ring
//! buffer. Uploads go through a scratch buffer allocated once at creation, so
//! recording and uploading never allocate after construction.

use crate::foundation::collections::RingBuffer;
use crate::foundation::math::Vec3;
use crate::render::{BackendResult, GeometryHandle, RenderBackend};

/// Position history of one moving object
#[derive(Debug, Clone)]
pub struct Trail {
    points: RingBuffer<[f32; 3]>,
    scratch: Vec<Vec3>,
}

impl Trail {
    /// Trail remembering `length` positions
    pub fn new(length: usize) -> Self {
        let points = RingBuffer::new(length);
        let scratch = vec![Vec3::zeros(); points.capacity()];
        Self { points, scratch }
    }

    /// Record the latest position, overwriting the oldest when full
    pub fn record(&mut self, position: Vec3) {
        self.points.push(position.into());
    }

    /// Maximum number of positions
    pub fn capacity(&self) -> usize {
        self.points.capacity()
    }

    /// Positions recorded so far, capped at capacity
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recent position
    pub fn latest(&self) -> Option<Vec3> {
        self.points.latest().map(Vec3::from)
    }

    /// Positions ordered oldest to newest, padded at the front with the oldest
    /// position so the slice always has `capacity` entries
    pub fn line_positions(&mut self) -> &[Vec3] {
        let capacity = self.scratch.len();
        let missing = capacity - self.points.len();
        let oldest = self.points.iter_chronological().next().map_or_else(Vec3::zeros, |p| Vec3::from(*p));

        for slot in &mut self.scratch[..missing] {
            *slot = oldest;
        }
        for (slot, point) in self.scratch[missing..].iter_mut().zip(self.points.iter_chronological()) {
            *slot = Vec3::from(*point);
        }
        &self.scratch
    }

    /// Upload the current line to a line-strip geometry of `capacity` vertices
    pub fn upload(&mut self, backend: &mut dyn RenderBackend, geometry: GeometryHandle) -> BackendResult<()> {
        let positions = self.line_positions();
        backend.update_geometry_positions(geometry, positions)
    }
}
