use super::{CircleLinkedListPool, PoolError, PoolIndex};

const FREE_HEAD: PoolIndex = 0;
const USED_HEAD: PoolIndex = 1;
const RESERVED: usize = 2;

/// Handle to a value stored in an [`ObjRefPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(PoolIndex);

impl ObjRef {
    pub fn index(self) -> PoolIndex {
        self.0
    }
}

/// Fixed-capacity store of values addressed by stable [`ObjRef`] handles.
///
/// Slots move between a free circle and a used circle of the underlying
/// [`CircleLinkedListPool`], so creating and removing are O(1).
#[derive(Debug, Clone)]
pub struct ObjRefPool<T> {
    links: CircleLinkedListPool,
    items: Vec<Option<T>>,
    used: usize,
}

impl<T> ObjRefPool<T> {
    pub fn new(capacity: usize) -> Result<Self, PoolError> {
        let size = capacity
            .checked_add(RESERVED)
            .ok_or(PoolError::InvalidSize(capacity))?;
        let mut links = CircleLinkedListPool::new(size)?;
        links.move_to(USED_HEAD, USED_HEAD);

        let mut items = Vec::with_capacity(size);
        items.resize_with(size, || None);

        Ok(Self {
            links,
            items,
            used: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.items.len() - RESERVED
    }

    pub fn len(&self) -> usize {
        self.used
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Store `value` in a free slot
    pub fn create(&mut self, value: T) -> Result<ObjRef, PoolError> {
        let slot = self.links.next(FREE_HEAD);
        if slot == FREE_HEAD {
            return Err(PoolError::Full);
        }
        self.links.move_to(slot, USED_HEAD);
        self.items[usize::from(slot)] = Some(value);
        self.used += 1;
        Ok(ObjRef(slot))
    }

    fn check(&self, handle: ObjRef) -> Result<usize, PoolError> {
        let index = usize::from(handle.0);
        if index < RESERVED {
            return Err(PoolError::Reserved(index));
        }
        match self.items.get(index) {
            None => Err(PoolError::OutOfRange {
                index,
                len: self.items.len(),
            }),
            Some(None) => Err(PoolError::NotInUse(index)),
            Some(Some(_)) => Ok(index),
        }
    }

    pub fn get(&self, handle: ObjRef) -> Option<&T> {
        let index = self.check(handle).ok()?;
        self.items[index].as_ref()
    }

    pub fn get_mut(&mut self, handle: ObjRef) -> Option<&mut T> {
        let index = self.check(handle).ok()?;
        self.items[index].as_mut()
    }

    /// Release the slot behind `handle`, returning its value
    pub fn remove(&mut self, handle: ObjRef) -> Result<T, PoolError> {
        let index = self.check(handle)?;
        self.links.move_to(handle.0, FREE_HEAD);
        self.used -= 1;
        self.items[index].take().ok_or(PoolError::NotInUse(index))
    }

    /// Live values, most recently created first
    pub fn iter(&self) -> impl Iterator<Item = (ObjRef, &T)> + '_ {
        self.links
            .iter_from(USED_HEAD)
            .filter_map(|slot| self.items[usize::from(slot)].as_ref().map(|v| (ObjRef(slot), v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_remove() {
        let mut pool = ObjRefPool::new(2).unwrap();
        let a = pool.create(10u32).unwrap();
        let b = pool.create(20u32).unwrap();

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.create(30), Err(PoolError::Full));
        assert_eq!(pool.get(a), Some(&10));

        *pool.get_mut(b).unwrap() = 25;
        assert_eq!(pool.remove(b), Ok(25));
        assert_eq!(pool.len(), 1);

        // The freed slot is reused
        let c = pool.create(30).unwrap();
        assert_eq!(c, b);
    }

    #[test]
    fn test_iter_newest_first() {
        let mut pool = ObjRefPool::new(4).unwrap();
        for v in ["a", "b", "c"] {
            pool.create(v).unwrap();
        }
        let values: Vec<_> = pool.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_invalid_handles() {
        let mut pool = ObjRefPool::<u32>::new(2).unwrap();
        let a = pool.create(1).unwrap();

        assert_eq!(pool.remove(ObjRef(0)), Err(PoolError::Reserved(0)));
        assert_eq!(pool.remove(ObjRef(1)), Err(PoolError::Reserved(1)));
        assert_eq!(
            pool.remove(ObjRef(9)),
            Err(PoolError::OutOfRange { index: 9, len: 4 })
        );

        pool.remove(a).unwrap();
        assert_eq!(pool.remove(a), Err(PoolError::NotInUse(usize::from(a.index()))));
        assert!(pool.get(a).is_none());
        assert!(pool.is_empty());
    }
}
