//! Tiles grouped into Z-ordered layers.
//!
//! Tile nodes and layer list heads share one [`CircleLinkedListPool`]:
//!
//! ```text
//! 0                      free tile circle head
//! 1 ..= layer_capacity   one list head per layer slot
//! above that             tile slots
//! ```
//!
//! A second pool tracks which layer slots are in use. Deleting a layer
//! splices its whole tile circle into the free circle with a single cross.
//! Tiles orphaned that way are invalidated by bumping the layer slot's
//! epoch, which keeps the delete O(1).

use glam::Vec3;
use log::debug;

use super::{SceneError, Tile, TileHandle};
use crate::pool::{CircleLinkedListPool, MAX_POOL_SIZE, PoolError, PoolIndex};
use crate::render::{RenderError, TileRender};

const FREE_TILE_HEAD: PoolIndex = 0;
const FREE_LAYER_HEAD: PoolIndex = 0;
const USED_LAYER_HEAD: PoolIndex = 1;
const LAYER_RESERVED: usize = 2;

/// Layer properties; `position.z` orders layers and negative z hides them
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Layer {
    /// `x` and `y` are added to every tile's translate when rendering
    pub position: Vec3,
}

impl Layer {
    pub fn is_visible(&self) -> bool {
        self.position.z >= 0.0
    }
}

/// Stable handle to a layer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerHandle(PoolIndex);

impl LayerHandle {
    pub const fn from_raw(index: PoolIndex) -> Self {
        Self(index)
    }

    pub const fn raw(self) -> PoolIndex {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TileSlot {
    tile: Tile,
    live: bool,
    layer: PoolIndex,
    epoch: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct LayerSlot {
    layer: Layer,
    live: bool,
    epoch: u32,
    tile_count: usize,
}

#[derive(Debug, Clone)]
pub struct Scene {
    tile_links: CircleLinkedListPool,
    tiles: Vec<TileSlot>,
    layer_links: CircleLinkedListPool,
    layers: Vec<LayerSlot>,
    tile_count: usize,
    layer_count: usize,
    sorted: Vec<PoolIndex>,
    dirty: bool,
}

impl Scene {
    pub fn new(tile_capacity: usize, layer_capacity: usize) -> Result<Self, SceneError> {
        let tile_size = tile_capacity
            .saturating_add(layer_capacity)
            .saturating_add(1);
        let layer_size = layer_capacity.saturating_add(LAYER_RESERVED);
        if tile_size > MAX_POOL_SIZE || layer_size > MAX_POOL_SIZE {
            return Err(PoolError::InvalidSize(tile_size.max(layer_size)).into());
        }

        let mut tile_links = CircleLinkedListPool::new(tile_size)?;
        for slot in LAYER_RESERVED..layer_size {
            let head = list_head(to_index(slot));
            tile_links.move_to(head, head);
        }

        let mut layer_links = CircleLinkedListPool::new(layer_size)?;
        layer_links.move_to(USED_LAYER_HEAD, USED_LAYER_HEAD);

        Ok(Self {
            tile_links,
            tiles: vec![TileSlot::default(); tile_size],
            layer_links,
            layers: vec![LayerSlot::default(); layer_size],
            tile_count: 0,
            layer_count: 0,
            sorted: Vec::with_capacity(layer_capacity),
            dirty: true,
        })
    }

    pub fn tile_capacity(&self) -> usize {
        self.tiles.len() - self.layer_capacity() - 1
    }

    pub fn layer_capacity(&self) -> usize {
        self.layers.len() - LAYER_RESERVED
    }

    pub fn tile_count(&self) -> usize {
        self.tile_count
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    pub fn layer_add(&mut self) -> Result<LayerHandle, SceneError> {
        let slot = self.layer_links.next(FREE_LAYER_HEAD);
        if slot == FREE_LAYER_HEAD {
            return Err(SceneError::LayersFull);
        }
        self.layer_links.move_to(slot, USED_LAYER_HEAD);

        let entry = &mut self.layers[usize::from(slot)];
        entry.layer = Layer::default();
        entry.live = true;
        entry.tile_count = 0;
        self.layer_count += 1;
        self.dirty = true;
        Ok(LayerHandle(slot))
    }

    /// Delete a layer and every tile in it
    pub fn layer_delete(&mut self, handle: LayerHandle) -> Result<(), SceneError> {
        let slot = self.check_layer(handle)?;
        let head = list_head(slot);

        // Splice the layer's tile circle (head included) into the free
        // circle, then take the head back out as an empty circle.
        self.tile_links.cross(FREE_TILE_HEAD, head);
        self.tile_links.move_to(head, head);

        let entry = &mut self.layers[usize::from(slot)];
        let drained = entry.tile_count;
        entry.live = false;
        entry.epoch = entry.epoch.wrapping_add(1);
        entry.tile_count = 0;

        self.layer_links.move_to(slot, FREE_LAYER_HEAD);
        self.tile_count -= drained;
        self.layer_count -= 1;
        self.dirty = true;
        debug!("Deleted layer {} with {} tiles", slot, drained);
        Ok(())
    }

    /// Read a layer without touching the render order cache
    pub fn layer(&self, handle: LayerHandle) -> Option<&Layer> {
        let slot = self.check_layer(handle).ok()?;
        Some(&self.layers[usize::from(slot)].layer)
    }

    /// Mutable access to a layer.
    ///
    /// Every call invalidates the cached render order, whether or not the
    /// layer's z actually changes.
    pub fn layer_at(&mut self, handle: LayerHandle) -> Option<&mut Layer> {
        self.dirty = true;
        let slot = self.check_layer(handle).ok()?;
        Some(&mut self.layers[usize::from(slot)].layer)
    }

    fn check_layer(&self, handle: LayerHandle) -> Result<PoolIndex, SceneError> {
        let idx = usize::from(handle.0);
        if idx < LAYER_RESERVED || idx >= self.layers.len() {
            return Err(SceneError::InvalidHandle(handle.0));
        }
        if !self.layers[idx].live {
            return Err(SceneError::NotInUse(handle.0));
        }
        Ok(handle.0)
    }

    /// Add a default tile at the front of `layer`
    pub fn tile_add(&mut self, layer: LayerHandle) -> Result<TileHandle, SceneError> {
        let slot = self.check_layer(layer)?;
        self.insert_after(list_head(slot), slot)
    }

    /// Add a default tile right after `anchor`, in the anchor's layer
    pub fn tile_add_after(&mut self, anchor: TileHandle) -> Result<TileHandle, SceneError> {
        let node = self.check_tile(anchor)?;
        let layer = self.tiles[usize::from(node)].layer;
        self.insert_after(node, layer)
    }

    fn insert_after(&mut self, anchor: PoolIndex, layer: PoolIndex) -> Result<TileHandle, SceneError> {
        let node = self.tile_links.next(FREE_TILE_HEAD);
        if node == FREE_TILE_HEAD {
            return Err(SceneError::Full);
        }
        self.tile_links.move_to(node, anchor);

        let layer_slot = &mut self.layers[usize::from(layer)];
        layer_slot.tile_count += 1;
        self.tiles[usize::from(node)] = TileSlot {
            tile: Tile::default(),
            live: true,
            layer,
            epoch: layer_slot.epoch,
        };
        self.tile_count += 1;
        Ok(TileHandle(node))
    }

    pub fn tile_remove(&mut self, handle: TileHandle) -> Result<(), SceneError> {
        let node = self.check_tile(handle)?;
        self.tile_links.move_to(node, FREE_TILE_HEAD);

        let entry = &mut self.tiles[usize::from(node)];
        entry.live = false;
        self.layers[usize::from(entry.layer)].tile_count -= 1;
        self.tile_count -= 1;
        Ok(())
    }

    fn check_tile(&self, handle: TileHandle) -> Result<PoolIndex, SceneError> {
        let idx = usize::from(handle.0);
        if idx <= self.layer_capacity() || idx >= self.tiles.len() {
            return Err(SceneError::InvalidHandle(handle.0));
        }
        let entry = &self.tiles[idx];
        let layer = &self.layers[usize::from(entry.layer)];
        if !entry.live || !layer.live || layer.epoch != entry.epoch {
            return Err(SceneError::NotInUse(handle.0));
        }
        Ok(handle.0)
    }

    pub fn tile(&self, handle: TileHandle) -> Option<&Tile> {
        let node = self.check_tile(handle).ok()?;
        Some(&self.tiles[usize::from(node)].tile)
    }

    pub fn tile_at(&mut self, handle: TileHandle) -> Option<&mut Tile> {
        let node = self.check_tile(handle).ok()?;
        Some(&mut self.tiles[usize::from(node)].tile)
    }

    /// Visible layers in render order
    pub fn visible_layers(&mut self) -> impl Iterator<Item = LayerHandle> + '_ {
        self.refresh_order();
        self.sorted.iter().map(|&slot| LayerHandle(slot))
    }

    fn refresh_order(&mut self) {
        if !self.dirty {
            return;
        }
        let layers = &self.layers;
        self.sorted.clear();
        self.sorted.extend(
            self.layer_links
                .iter_from(USED_LAYER_HEAD)
                .filter(|&slot| layers[usize::from(slot)].layer.is_visible()),
        );
        // Stable: equal z keeps layer list order
        self.sorted.sort_by(|&a, &b| {
            let za = layers[usize::from(a)].layer.position.z;
            let zb = layers[usize::from(b)].layer.position.z;
            za.total_cmp(&zb)
        });
        self.dirty = false;
        debug!(
            "Rebuilt layer order: {} of {} layers visible",
            self.sorted.len(),
            self.layer_count
        );
    }

    /// Lazy walk over all visible tiles.
    ///
    /// Layers come in ascending z; within a layer the newest tile comes
    /// first. Each tile's translate already includes its layer offset. The
    /// sequence borrows the scene until dropped.
    pub fn tile_sequence(&mut self) -> SceneTileSequence<'_> {
        self.refresh_order();
        let scene: &Scene = self;
        let remaining = scene
            .sorted
            .iter()
            .map(|&slot| scene.layers[usize::from(slot)].tile_count)
            .sum();
        let mut sequence = SceneTileSequence {
            scene,
            layer_pos: 0,
            head: FREE_TILE_HEAD,
            current: FREE_TILE_HEAD,
            remaining,
        };
        sequence.enter_layer();
        sequence
    }

    /// Feed the visible tiles to `sink`
    pub fn render(&mut self, sink: &mut dyn TileRender) -> Result<usize, RenderError> {
        if sink.busy() {
            return Err(RenderError::Busy);
        }
        sink.render_tiles(&mut self.tile_sequence())
    }
}

/// Iterator returned by [`Scene::tile_sequence`]
pub struct SceneTileSequence<'a> {
    scene: &'a Scene,
    layer_pos: usize,
    head: PoolIndex,
    current: PoolIndex,
    remaining: usize,
}

impl SceneTileSequence<'_> {
    fn enter_layer(&mut self) {
        if let Some(&slot) = self.scene.sorted.get(self.layer_pos) {
            self.head = list_head(slot);
            self.current = self.scene.tile_links.next(self.head);
        } else {
            self.head = FREE_TILE_HEAD;
            self.current = FREE_TILE_HEAD;
        }
    }
}

impl Iterator for SceneTileSequence<'_> {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        loop {
            if self.layer_pos >= self.scene.sorted.len() {
                return None;
            }
            if self.current != self.head {
                let node = self.current;
                self.current = self.scene.tile_links.next(node);
                self.remaining -= 1;

                let slot = self.scene.sorted[self.layer_pos];
                let offset = self.scene.layers[usize::from(slot)].layer.position.truncate();
                let mut tile = self.scene.tiles[usize::from(node)].tile;
                tile.translate += offset;
                return Some(tile);
            }
            self.layer_pos += 1;
            self.enter_layer();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for SceneTileSequence<'_> {}

/// Tile-pool node heading the tile circle of layer slot `slot`.
///
/// Layer slots start at 2 and their heads at 1.
fn list_head(slot: PoolIndex) -> PoolIndex {
    slot - 1
}

// Callers pass indices below a pool size already checked against MAX_POOL_SIZE
fn to_index(i: usize) -> PoolIndex {
    PoolIndex::try_from(i).unwrap_or(PoolIndex::MAX)
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::render::QuadBuilder;

    fn add_tagged(scene: &mut Scene, layer: LayerHandle, x: f32) -> TileHandle {
        let handle = scene.tile_add(layer).unwrap();
        scene.tile_at(handle).unwrap().translate = Vec2::new(x, 0.0);
        handle
    }

    fn xs(scene: &mut Scene) -> Vec<f32> {
        scene.tile_sequence().map(|t| t.translate.x).collect()
    }

    fn set_z(scene: &mut Scene, layer: LayerHandle, z: f32) {
        scene.layer_at(layer).unwrap().position.z = z;
    }

    #[test]
    fn test_layers_render_in_z_order() {
        let mut scene = Scene::new(16, 4).unwrap();
        let l3 = scene.layer_add().unwrap();
        let l1 = scene.layer_add().unwrap();
        let l2 = scene.layer_add().unwrap();
        set_z(&mut scene, l3, 3.0);
        set_z(&mut scene, l1, 1.0);
        set_z(&mut scene, l2, 2.0);

        add_tagged(&mut scene, l3, 30.0);
        add_tagged(&mut scene, l1, 10.0);
        add_tagged(&mut scene, l2, 20.0);
        add_tagged(&mut scene, l1, 11.0);

        assert_eq!(xs(&mut scene), vec![11.0, 10.0, 20.0, 30.0]);
        let order: Vec<_> = scene.visible_layers().collect();
        assert_eq!(order, vec![l1, l2, l3]);
    }

    #[test]
    fn test_negative_z_hides_layer() {
        let mut scene = Scene::new(8, 2).unwrap();
        let shown = scene.layer_add().unwrap();
        let hidden = scene.layer_add().unwrap();
        set_z(&mut scene, hidden, -1.0);

        add_tagged(&mut scene, shown, 1.0);
        add_tagged(&mut scene, hidden, 2.0);

        assert_eq!(xs(&mut scene), vec![1.0]);
        assert_eq!(scene.tile_sequence().len(), 1);
        assert_eq!(scene.tile_count(), 2);
    }

    #[test]
    fn test_render_counts_visible_tiles_only() {
        let mut scene = Scene::new(8, 2).unwrap();
        let shown = scene.layer_add().unwrap();
        let hidden = scene.layer_add().unwrap();
        set_z(&mut scene, hidden, -1.0);
        for x in [0.0, 1.0] {
            add_tagged(&mut scene, shown, x);
        }
        for x in [0.0, 1.0, 2.0] {
            add_tagged(&mut scene, hidden, x);
        }

        let mut builder = QuadBuilder::new(64, 64, 2, vec![[0, 0, 128, 128]]);
        assert_eq!(scene.render(&mut builder), Ok(2));

        add_tagged(&mut scene, shown, 5.0);
        assert_eq!(
            scene.render(&mut builder),
            Err(RenderError::Overflow { len: 3, capacity: 2 })
        );
        assert_eq!(builder.quad_count(), 2);
    }

    #[test]
    fn test_layer_offset_applied() {
        let mut scene = Scene::new(4, 1).unwrap();
        let layer = scene.layer_add().unwrap();
        scene.layer_at(layer).unwrap().position = Vec3::new(100.0, 50.0, 0.0);

        let tile = scene.tile_add(layer).unwrap();
        scene.tile_at(tile).unwrap().translate = Vec2::new(1.0, 2.0);

        let rendered: Vec<_> = scene.tile_sequence().collect();
        assert_eq!(rendered[0].translate, Vec2::new(101.0, 52.0));
        // Stored tile is untouched
        assert_eq!(scene.tile(tile).unwrap().translate, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_layer_at_always_dirties() {
        let mut scene = Scene::new(4, 2).unwrap();
        let a = scene.layer_add().unwrap();
        scene.tile_sequence().count();
        assert!(!scene.dirty);

        scene.layer(a);
        assert!(!scene.dirty);

        scene.layer_at(a);
        assert!(scene.dirty);
        scene.tile_sequence().count();
        assert!(!scene.dirty);
    }

    #[test]
    fn test_layer_delete_frees_tiles() {
        let mut scene = Scene::new(4, 2).unwrap();
        let a = scene.layer_add().unwrap();
        let b = scene.layer_add().unwrap();
        let doomed: Vec<_> = (0..3).map(|i| add_tagged(&mut scene, a, i as f32)).collect();
        let kept = add_tagged(&mut scene, b, 9.0);
        assert_eq!(scene.tile_add(b), Err(SceneError::Full));

        scene.layer_delete(a).unwrap();
        assert_eq!(scene.tile_count(), 1);
        assert_eq!(scene.layer_count(), 1);
        assert_eq!(xs(&mut scene), vec![9.0]);

        // Orphaned handles are rejected
        for handle in doomed {
            assert_eq!(scene.tile_remove(handle), Err(SceneError::NotInUse(handle.raw())));
        }
        assert!(scene.tile(kept).is_some());
        assert_eq!(scene.layer_delete(a), Err(SceneError::NotInUse(a.raw())));

        // Capacity came back
        for _ in 0..3 {
            scene.tile_add(b).unwrap();
        }
        assert_eq!(scene.tile_count(), 4);
    }

    #[test]
    fn test_reused_layer_slot_rejects_old_tiles() {
        let mut scene = Scene::new(4, 1).unwrap();
        let first = scene.layer_add().unwrap();
        let old = scene.tile_add(first).unwrap();
        scene.layer_delete(first).unwrap();

        let second = scene.layer_add().unwrap();
        assert_eq!(first, second);
        assert!(scene.tile(old).is_none());
        assert_eq!(scene.tile_count(), 0);
    }

    #[test]
    fn test_tile_add_after_stays_in_layer() {
        let mut scene = Scene::new(8, 2).unwrap();
        let a = scene.layer_add().unwrap();
        let b = scene.layer_add().unwrap();
        set_z(&mut scene, b, 1.0);

        let first = add_tagged(&mut scene, a, 1.0);
        add_tagged(&mut scene, a, 2.0);
        add_tagged(&mut scene, b, 5.0);
        let follower = scene.tile_add_after(first).unwrap();
        scene.tile_at(follower).unwrap().translate.x = 1.5;

        assert_eq!(xs(&mut scene), vec![2.0, 1.0, 1.5, 5.0]);

        scene.tile_remove(follower).unwrap();
        assert_eq!(xs(&mut scene), vec![2.0, 1.0, 5.0]);
    }

    #[test]
    fn test_invalid_handles() {
        let mut scene = Scene::new(4, 2).unwrap();
        let layer = scene.layer_add().unwrap();

        for raw in [0, 1, 4] {
            assert_eq!(
                scene.layer_delete(LayerHandle::from_raw(raw)),
                Err(SceneError::InvalidHandle(raw))
            );
        }
        // Free head and layer heads are never tile handles
        for raw in [0, 1, 2, 7] {
            assert_eq!(
                scene.tile_remove(TileHandle::from_raw(raw)),
                Err(SceneError::InvalidHandle(raw))
            );
        }
        assert_eq!(
            scene.tile_add(LayerHandle::from_raw(3)),
            Err(SceneError::NotInUse(3))
        );
        assert!(scene.tile_add(layer).is_ok());
    }

    #[test]
    fn test_layers_full() {
        let mut scene = Scene::new(1, 2).unwrap();
        scene.layer_add().unwrap();
        scene.layer_add().unwrap();
        assert_eq!(scene.layer_add(), Err(SceneError::LayersFull));
    }

    #[test]
    fn test_capacity_checked() {
        assert!(Scene::new(MAX_POOL_SIZE, 1).is_err());
        let scene = Scene::new(10, 3).unwrap();
        assert_eq!(scene.tile_capacity(), 10);
        assert_eq!(scene.layer_capacity(), 3);
    }
}
