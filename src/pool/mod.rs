mod circle;
mod obj_ref;

pub use circle::{CircleIter, CircleLinkedListPool, MAX_POOL_SIZE, PoolError, PoolIndex};
pub use obj_ref::{ObjRef, ObjRefPool};
