use log::debug;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    #[error("No free block can hold {requested} units")]
    OutOfSpace { requested: usize },

    #[error("Range of {size} units at {pos} overlaps a free block")]
    Overlap { pos: usize, size: usize },

    #[error("Range starting at {pos} with size {size} exceeds total size {total}")]
    OutOfRange { pos: usize, size: usize, total: usize },

    #[error("Zero-sized ranges cannot be allocated or freed")]
    ZeroSize,
}

/// A contiguous run of unallocated units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
    pub pos: usize,
    pub size: usize,
}

impl FreeBlock {
    fn end(&self) -> usize {
        self.pos + self.size
    }
}

/// Best-fit allocator over the address range `[0, total_size)`.
///
/// The free list is kept ordered by position with adjacent blocks always
/// merged. Allocation picks the smallest block that can hold the request
/// (the lowest such block on ties) and carves from its start.
#[derive(Debug, Clone)]
pub struct SimpleMemoryAllocator {
    total_size: usize,
    free_list: Vec<FreeBlock>,
}

impl SimpleMemoryAllocator {
    pub fn new(total_size: usize) -> Self {
        let free_list = if total_size > 0 {
            vec![FreeBlock {
                pos: 0,
                size: total_size,
            }]
        } else {
            Vec::new()
        };
        Self {
            total_size,
            free_list,
        }
    }

    /// Reserve `size` units, returning the start of the range.
    ///
    /// On failure the allocator is left untouched.
    pub fn allocate(&mut self, size: usize) -> Result<usize, AllocError> {
        if size == 0 {
            return Err(AllocError::ZeroSize);
        }

        let (idx, block) = self
            .free_list
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, b)| b.size >= size)
            .min_by_key(|(_, b)| b.size)
            .ok_or(AllocError::OutOfSpace { requested: size })?;

        if block.size == size {
            self.free_list.remove(idx);
        } else {
            let entry = &mut self.free_list[idx];
            entry.pos += size;
            entry.size -= size;
        }

        debug!("Allocated {} units at {} (from block of {})", size, block.pos, block.size);
        Ok(block.pos)
    }

    /// Return `size` units starting at `pos` to the free list.
    ///
    /// Fails with [`AllocError::Overlap`] if any part of the range is
    /// already free, which indicates a double free.
    pub fn free(&mut self, pos: usize, size: usize) -> Result<(), AllocError> {
        if size == 0 {
            return Err(AllocError::ZeroSize);
        }
        let end = match pos.checked_add(size) {
            Some(end) if end <= self.total_size => end,
            _ => {
                return Err(AllocError::OutOfRange {
                    pos,
                    size,
                    total: self.total_size,
                });
            }
        };

        // First block starting after `pos`
        let idx = self.free_list.partition_point(|b| b.pos <= pos);
        let prev = idx.checked_sub(1).map(|i| self.free_list[i]);
        let next = self.free_list.get(idx).copied();

        if prev.is_some_and(|p| p.end() > pos) || next.is_some_and(|n| end > n.pos) {
            return Err(AllocError::Overlap { pos, size });
        }

        let merge_prev = prev.is_some_and(|p| p.end() == pos);
        let merge_next = next.is_some_and(|n| n.pos == end);

        match (merge_prev, merge_next) {
            (true, true) => {
                let next_size = self.free_list[idx].size;
                self.free_list[idx - 1].size += size + next_size;
                self.free_list.remove(idx);
            }
            (true, false) => self.free_list[idx - 1].size += size,
            (false, true) => {
                let entry = &mut self.free_list[idx];
                entry.pos = pos;
                entry.size += size;
            }
            (false, false) => self.free_list.insert(idx, FreeBlock { pos, size }),
        }

        debug!("Freed {} units at {}", size, pos);
        Ok(())
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Total number of unallocated units
    pub fn free_space(&self) -> usize {
        self.free_list.iter().map(|b| b.size).sum()
    }

    /// Size of the largest request that would currently succeed
    pub fn largest_free(&self) -> usize {
        self.free_list.iter().map(|b| b.size).max().unwrap_or(0)
    }

    /// Free blocks in ascending position order
    pub fn free_blocks(&self) -> impl Iterator<Item = FreeBlock> + '_ {
        self.free_list.iter().copied()
    }

    pub fn log_free_list(&self) {
        debug!(
            "Allocator free list ({} of {} units free):",
            self.free_space(),
            self.total_size
        );
        for block in &self.free_list {
            debug!("  {} {}", block.pos, block.size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(alloc: &SimpleMemoryAllocator) -> Vec<(usize, usize)> {
        alloc.free_blocks().map(|b| (b.pos, b.size)).collect()
    }

    #[test]
    fn test_allocate_free_scenario() {
        let mut alloc = SimpleMemoryAllocator::new(100);

        assert_eq!(alloc.allocate(30), Ok(0));
        assert_eq!(alloc.allocate(20), Ok(30));
        assert_eq!(blocks(&alloc), vec![(50, 50)]);

        alloc.free(0, 30).unwrap();
        assert_eq!(blocks(&alloc), vec![(0, 30), (50, 50)]);

        // Best fit picks the 30-unit hole over the 50-unit tail
        assert_eq!(alloc.allocate(10), Ok(0));
        assert_eq!(blocks(&alloc), vec![(10, 20), (50, 50)]);

        alloc.free(30, 20).unwrap();
        assert_eq!(blocks(&alloc), vec![(10, 90)]);
        assert_eq!(alloc.free_space(), 90);
    }

    #[test]
    fn test_exact_fit_removes_block() {
        let mut alloc = SimpleMemoryAllocator::new(16);
        assert_eq!(alloc.allocate(16), Ok(0));
        assert_eq!(alloc.free_blocks().count(), 0);
        assert_eq!(
            alloc.allocate(1),
            Err(AllocError::OutOfSpace { requested: 1 })
        );

        alloc.free(0, 16).unwrap();
        assert_eq!(blocks(&alloc), vec![(0, 16)]);
    }

    #[test]
    fn test_out_of_space_leaves_state() {
        let mut alloc = SimpleMemoryAllocator::new(10);
        alloc.allocate(4).unwrap();
        let before = blocks(&alloc);

        assert_eq!(
            alloc.allocate(7),
            Err(AllocError::OutOfSpace { requested: 7 })
        );
        assert_eq!(blocks(&alloc), before);
    }

    #[test]
    fn test_best_fit_prefers_smallest_block() {
        let mut alloc = SimpleMemoryAllocator::new(100);
        let a = alloc.allocate(10).unwrap();
        let _b = alloc.allocate(10).unwrap();
        let c = alloc.allocate(5).unwrap();
        let _d = alloc.allocate(10).unwrap();

        alloc.free(a, 10).unwrap();
        alloc.free(c, 5).unwrap();
        // Holes: [0,10), [20,25), [35,100)
        assert_eq!(alloc.allocate(4), Ok(20));
        assert_eq!(alloc.allocate(8), Ok(0));
    }

    #[test]
    fn test_free_merges_both_neighbours() {
        let mut alloc = SimpleMemoryAllocator::new(30);
        let a = alloc.allocate(10).unwrap();
        let b = alloc.allocate(10).unwrap();
        let c = alloc.allocate(10).unwrap();

        alloc.free(a, 10).unwrap();
        alloc.free(c, 10).unwrap();
        assert_eq!(blocks(&alloc), vec![(0, 10), (20, 10)]);

        alloc.free(b, 10).unwrap();
        assert_eq!(blocks(&alloc), vec![(0, 30)]);
    }

    #[test]
    fn test_free_inserts_between_without_merge() {
        let mut alloc = SimpleMemoryAllocator::new(50);
        for _ in 0..5 {
            alloc.allocate(10).unwrap();
        }
        alloc.free(0, 10).unwrap();
        alloc.free(40, 10).unwrap();
        alloc.free(20, 10).unwrap();
        assert_eq!(blocks(&alloc), vec![(0, 10), (20, 10), (40, 10)]);
    }

    #[test]
    fn test_double_free_is_overlap() {
        let mut alloc = SimpleMemoryAllocator::new(40);
        let a = alloc.allocate(10).unwrap();
        alloc.allocate(10).unwrap();
        alloc.free(a, 10).unwrap();

        assert_eq!(
            alloc.free(a, 10),
            Err(AllocError::Overlap { pos: 0, size: 10 })
        );
        // Partially overlapping the tail block
        assert_eq!(
            alloc.free(15, 10),
            Err(AllocError::Overlap { pos: 15, size: 10 })
        );
        assert_eq!(blocks(&alloc), vec![(0, 10), (20, 20)]);
    }

    #[test]
    fn test_zero_and_out_of_range() {
        let mut alloc = SimpleMemoryAllocator::new(8);
        assert_eq!(alloc.allocate(0), Err(AllocError::ZeroSize));
        assert_eq!(alloc.free(0, 0), Err(AllocError::ZeroSize));
        assert!(matches!(
            alloc.free(6, 4),
            Err(AllocError::OutOfRange { .. })
        ));
        assert!(matches!(
            alloc.free(usize::MAX, 2),
            Err(AllocError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_zero_total_size() {
        let mut alloc = SimpleMemoryAllocator::new(0);
        assert_eq!(alloc.largest_free(), 0);
        assert_eq!(
            alloc.allocate(1),
            Err(AllocError::OutOfSpace { requested: 1 })
        );
    }
}
