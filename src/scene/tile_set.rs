use log::debug;

use super::{SceneError, Tile, TileHandle};
use crate::pool::{CircleLinkedListPool, PoolIndex};
use crate::render::{RenderError, TileRender};

const FREE_HEAD: PoolIndex = 0;
const USED_HEAD: PoolIndex = 1;
const RESERVED: usize = 2;

/// Capacity-bounded set of tiles with stable handles.
///
/// Tile slots are threaded through two circles of a shared
/// [`CircleLinkedListPool`]: the free circle at index 0 and the used circle
/// at index 1. Adding and removing move one node between them.
#[derive(Debug, Clone)]
pub struct TileSet {
    links: CircleLinkedListPool,
    tiles: Vec<Tile>,
    live: Vec<bool>,
    count: usize,
}

impl TileSet {
    pub fn new(capacity: usize) -> Result<Self, SceneError> {
        let size = capacity.saturating_add(RESERVED);
        let mut links = CircleLinkedListPool::new(size)?;
        links.move_to(USED_HEAD, USED_HEAD);

        Ok(Self {
            links,
            tiles: vec![Tile::default(); size],
            live: vec![false; size],
            count: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.tiles.len() - RESERVED
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Add a default tile at the front of the sequence
    pub fn add(&mut self) -> Result<TileHandle, SceneError> {
        self.insert_after(USED_HEAD)
    }

    /// Add a default tile directly after `anchor` in the sequence.
    ///
    /// Useful for keeping related tiles contiguous.
    pub fn add_after(&mut self, anchor: TileHandle) -> Result<TileHandle, SceneError> {
        let anchor = self.check(anchor)?;
        self.insert_after(anchor)
    }

    fn insert_after(&mut self, anchor: PoolIndex) -> Result<TileHandle, SceneError> {
        let slot = self.links.next(FREE_HEAD);
        if slot == FREE_HEAD {
            return Err(SceneError::Full);
        }
        self.links.move_to(slot, anchor);

        let idx = usize::from(slot);
        self.tiles[idx] = Tile::default();
        self.live[idx] = true;
        self.count += 1;
        Ok(TileHandle(slot))
    }

    pub fn remove(&mut self, handle: TileHandle) -> Result<(), SceneError> {
        let slot = self.check(handle)?;
        self.links.move_to(slot, FREE_HEAD);
        self.live[usize::from(slot)] = false;
        self.count -= 1;
        Ok(())
    }

    /// Remove every tile in O(1) link operations
    pub fn clear(&mut self) {
        if self.links.is_alone(USED_HEAD) {
            return;
        }
        // Merge the used circle into the free circle, then pull the used
        // head back out on its own.
        self.links.cross(FREE_HEAD, USED_HEAD);
        self.links.move_to(USED_HEAD, USED_HEAD);
        self.live.fill(false);
        debug!("Cleared {} tiles", self.count);
        self.count = 0;
    }

    fn check(&self, handle: TileHandle) -> Result<PoolIndex, SceneError> {
        let idx = usize::from(handle.0);
        if idx < RESERVED || idx >= self.tiles.len() {
            return Err(SceneError::InvalidHandle(handle.0));
        }
        if !self.live[idx] {
            return Err(SceneError::NotInUse(handle.0));
        }
        Ok(handle.0)
    }

    pub fn tile(&self, handle: TileHandle) -> Option<&Tile> {
        let slot = self.check(handle).ok()?;
        self.tiles.get(usize::from(slot))
    }

    pub fn tile_at(&mut self, handle: TileHandle) -> Option<&mut Tile> {
        let slot = self.check(handle).ok()?;
        self.tiles.get_mut(usize::from(slot))
    }

    /// Lazy walk over the live tiles, newest first unless inserted with
    /// [`Self::add_after`].
    ///
    /// The sequence borrows the set, so it has to be dropped before the set
    /// can be changed again.
    pub fn tile_sequence(&self) -> TileSequence<'_> {
        TileSequence {
            set: self,
            current: self.links.next(USED_HEAD),
            remaining: self.count,
        }
    }

    /// Handles of live tiles in sequence order
    pub fn handles(&self) -> impl Iterator<Item = TileHandle> + '_ {
        self.links.iter_from(USED_HEAD).map(TileHandle)
    }

    /// Feed the whole sequence to `sink`
    pub fn render(&self, sink: &mut dyn TileRender) -> Result<usize, RenderError> {
        if sink.busy() {
            return Err(RenderError::Busy);
        }
        sink.render_tiles(&mut self.tile_sequence())
    }
}

/// Iterator returned by [`TileSet::tile_sequence`]
pub struct TileSequence<'a> {
    set: &'a TileSet,
    current: PoolIndex,
    remaining: usize,
}

impl Iterator for TileSequence<'_> {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        if self.current == USED_HEAD {
            return None;
        }
        let tile = self.set.tiles[usize::from(self.current)];
        self.current = self.set.links.next(self.current);
        self.remaining -= 1;
        Some(tile)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for TileSequence<'_> {}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::scene::TexRef;

    fn tag(set: &mut TileSet, handle: TileHandle, x: f32) {
        set.tile_at(handle).unwrap().translate = Vec2::new(x, 0.0);
    }

    fn order(set: &TileSet) -> Vec<f32> {
        set.tile_sequence().map(|t| t.translate.x).collect()
    }

    #[test]
    fn test_add_until_full() {
        let mut set = TileSet::new(3).unwrap();
        for _ in 0..3 {
            set.add().unwrap();
        }
        assert_eq!(set.len(), 3);
        assert_eq!(set.add(), Err(SceneError::Full));
    }

    #[test]
    fn test_sequence_is_newest_first() {
        let mut set = TileSet::new(8).unwrap();
        for x in 1..=3 {
            let h = set.add().unwrap();
            tag(&mut set, h, x as f32);
        }
        assert_eq!(order(&set), vec![3.0, 2.0, 1.0]);
        assert_eq!(set.tile_sequence().len(), 3);
    }

    #[test]
    fn test_add_after_keeps_group_contiguous() {
        let mut set = TileSet::new(8).unwrap();
        let a = set.add().unwrap();
        tag(&mut set, a, 1.0);
        let b = set.add().unwrap();
        tag(&mut set, b, 2.0);

        let a2 = set.add_after(a).unwrap();
        tag(&mut set, a2, 1.5);

        assert_eq!(order(&set), vec![2.0, 1.0, 1.5]);
    }

    #[test]
    fn test_remove_and_reuse() {
        let mut set = TileSet::new(2).unwrap();
        let a = set.add().unwrap();
        let b = set.add().unwrap();
        set.tile_at(b).unwrap().tex = TexRef::Slot(7);

        set.remove(b).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.remove(b), Err(SceneError::NotInUse(b.raw())));
        assert!(set.tile(b).is_none());

        // Reused slots start from a default tile
        let c = set.add().unwrap();
        assert_eq!(c, b);
        assert_eq!(set.tile(c).unwrap().tex, TexRef::default());
        assert!(set.tile(a).is_some());
    }

    #[test]
    fn test_sentinel_and_out_of_range_handles() {
        let mut set = TileSet::new(2).unwrap();
        for raw in [0, 1, 4, 100] {
            let handle = TileHandle::from_raw(raw);
            assert_eq!(set.remove(handle), Err(SceneError::InvalidHandle(raw)));
            assert!(set.tile_at(handle).is_none());
        }
        assert_eq!(
            set.add_after(TileHandle::from_raw(1)),
            Err(SceneError::InvalidHandle(1))
        );
    }

    #[test]
    fn test_clear() {
        let mut set = TileSet::new(4).unwrap();
        let handles: Vec<_> = (0..4).map(|_| set.add().unwrap()).collect();
        set.clear();

        assert!(set.is_empty());
        assert_eq!(set.tile_sequence().count(), 0);
        assert!(handles.iter().all(|&h| set.tile(h).is_none()));

        // All capacity is available again
        for _ in 0..4 {
            set.add().unwrap();
        }
        assert_eq!(set.add(), Err(SceneError::Full));
    }

    #[test]
    fn test_capacity_limit() {
        assert!(TileSet::new(crate::pool::MAX_POOL_SIZE - 2).is_ok());
        assert!(matches!(
            TileSet::new(crate::pool::MAX_POOL_SIZE),
            Err(SceneError::Pool(_))
        ));
    }
}
