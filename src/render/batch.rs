use std::ops::Range;

use log::{debug, warn};

use super::{RenderError, TileVertex};
use crate::allocator::SimpleMemoryAllocator;
use crate::pool::{ObjRef, ObjRefPool};

/// Handle to a reserved run of quads in [`VertexBatches`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchId(ObjRef);

impl BatchId {
    pub fn raw(self) -> u16 {
        self.0.index()
    }
}

#[derive(Debug, Clone, Copy)]
struct BatchRegion {
    first_quad: usize,
    quads: usize,
}

/// One shared vertex buffer carved into independently owned batches.
///
/// Quad ranges are handed out by a [`SimpleMemoryAllocator`] and the live
/// batches are tracked in an [`ObjRefPool`], so a batch can be released in
/// any order without moving the others.
#[derive(Debug, Clone)]
pub struct VertexBatches {
    allocator: SimpleMemoryAllocator,
    batches: ObjRefPool<BatchRegion>,
    vertices: Vec<TileVertex>,
}

impl VertexBatches {
    pub fn new(quad_capacity: usize, max_batches: usize) -> Result<Self, RenderError> {
        Ok(Self {
            allocator: SimpleMemoryAllocator::new(quad_capacity),
            batches: ObjRefPool::new(max_batches)?,
            vertices: vec![TileVertex::default(); quad_capacity * 4],
        })
    }

    pub fn quad_capacity(&self) -> usize {
        self.allocator.total_size()
    }

    pub fn free_quads(&self) -> usize {
        self.allocator.free_space()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Reserve room for `quads` quads
    pub fn reserve(&mut self, quads: usize) -> Result<BatchId, RenderError> {
        let first_quad = self.allocator.allocate(quads)?;
        match self.batches.create(BatchRegion { first_quad, quads }) {
            Ok(handle) => {
                debug!("Reserved {quads} quads at {first_quad}");
                Ok(BatchId(handle))
            }
            Err(e) => {
                // Give the range back so a full batch table leaves no trace
                if let Err(free_err) = self.allocator.free(first_quad, quads) {
                    warn!("Failed to roll back quad range: {free_err}");
                }
                Err(e.into())
            }
        }
    }

    pub fn release(&mut self, id: BatchId) -> Result<(), RenderError> {
        let region = self
            .batches
            .remove(id.0)
            .map_err(|_| RenderError::InvalidBatch(id.raw()))?;
        self.allocator.free(region.first_quad, region.quads)?;
        debug!("Released {} quads at {}", region.quads, region.first_quad);
        Ok(())
    }

    /// Vertex index range of a batch within [`Self::vertices`]
    pub fn range(&self, id: BatchId) -> Option<Range<usize>> {
        let region = self.batches.get(id.0)?;
        let start = region.first_quad * 4;
        Some(start..start + region.quads * 4)
    }

    pub fn batch_mut(&mut self, id: BatchId) -> Option<&mut [TileVertex]> {
        let range = self.range(id)?;
        self.vertices.get_mut(range)
    }

    /// Copy whole quads into a batch, returning how many quads were written
    pub fn write(&mut self, id: BatchId, vertices: &[TileVertex]) -> Result<usize, RenderError> {
        let target = self
            .batch_mut(id)
            .ok_or(RenderError::InvalidBatch(id.raw()))?;
        if vertices.len() > target.len() {
            return Err(RenderError::Overflow {
                len: vertices.len() / 4,
                capacity: target.len() / 4,
            });
        }
        let whole = vertices.len() - vertices.len() % 4;
        target[..whole].copy_from_slice(&vertices[..whole]);
        Ok(whole / 4)
    }

    pub fn vertices(&self) -> &[TileVertex] {
        &self.vertices
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}
