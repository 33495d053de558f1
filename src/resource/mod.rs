mod hash;
mod memory;

pub use hash::{ResourceId, fnv_hash, fnv_hash_const};
pub use memory::MemoryResources;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("Resource {0:#010x} not found")]
    NotFound(ResourceId),

    #[error("Batch ids must be in ascending order (at position {0})")]
    Unsorted(usize),
}

/// Read access to resources keyed by content hash
pub trait ResourceManager {
    fn get(&self, id: ResourceId) -> Option<&[u8]>;

    /// Look up several resources at once.
    ///
    /// `ids` must be sorted ascending. Either every id resolves or the call
    /// fails with the first missing one.
    fn get_batch(&self, ids: &[ResourceId]) -> Result<Vec<&[u8]>, ResourceError> {
        if let Some(pos) = ids.windows(2).position(|w| w[0] > w[1]) {
            return Err(ResourceError::Unsorted(pos + 1));
        }
        ids.iter()
            .map(|&id| self.get(id).ok_or(ResourceError::NotFound(id)))
            .collect()
    }
}

/// Ordered collection of raw resource blobs, such as encoded images
pub trait ResourceDataSet {
    fn len(&self) -> usize;

    fn data(&self, index: usize) -> Option<&[u8]>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: AsRef<[u8]>> ResourceDataSet for [T] {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn data(&self, index: usize) -> Option<&[u8]> {
        self.get(index).map(AsRef::as_ref)
    }
}

impl<T: AsRef<[u8]>> ResourceDataSet for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn data(&self, index: usize) -> Option<&[u8]> {
        self.get(index).map(AsRef::as_ref)
    }
}
