mod interval;

pub use interval::{AllocError, FreeBlock, SimpleMemoryAllocator};
