//! Guillotine bin packing over a lazily grown binary split tree.
//!
//! Every region of the box is either still empty, completely occupied, or
//! split in two along one axis. The root region splits vertically and the
//! axis alternates with depth. Rectangles are inserted widest first; each
//! insertion walks the tree depth-first with an explicit stack and takes the
//! first empty region large enough to hold it.

use log::debug;
use thiserror::Error;

/// Largest bounding box extent accepted by [`pack`]
pub const MAX_PACK_EXTENT: u8 = 128;

/// Size of one rectangle to pack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackSize {
    pub width: u8,
    pub height: u8,
}

impl PackSize {
    pub fn new(width: u8, height: u8) -> Self {
        Self { width, height }
    }
}

/// Top-left placement of a packed rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackPos {
    pub x: u8,
    pub y: u8,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    #[error("Bounding box {width}x{height} exceeds {MAX_PACK_EXTENT}x{MAX_PACK_EXTENT}")]
    InvalidBounds { width: u8, height: u8 },

    #[error("No rectangles to pack")]
    EmptyInput,

    #[error("Rectangle {0} has zero width or height")]
    ZeroSized(usize),

    #[error("Bounding box is already completely occupied")]
    RootFull,

    #[error("No free region left for rectangle {0}")]
    PlacementFailed(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    /// Split offset is along x: first child is left, second is right
    Vertical,
    /// Split offset is along y: first child is top, second is bottom
    Horizontal,
}

impl Axis {
    fn flipped(self) -> Self {
        match self {
            Axis::Vertical => Axis::Horizontal,
            Axis::Horizontal => Axis::Vertical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Empty,
    Full,
    Split(usize),
}

#[derive(Debug, Clone, Copy)]
struct SplitNode {
    offset: u8,
    first: Slot,
    second: Slot,
}

#[derive(Debug, Clone, Copy)]
enum SlotRef {
    Root,
    First(usize),
    Second(usize),
}

/// Split tree owned by a single [`pack`] call
struct SplitTree {
    root: Slot,
    nodes: Vec<SplitNode>,
}

impl SplitTree {
    fn with_capacity(count: usize) -> Self {
        Self {
            root: Slot::Empty,
            nodes: Vec::with_capacity(count * 2),
        }
    }

    fn get(&self, slot: SlotRef) -> Slot {
        match slot {
            SlotRef::Root => self.root,
            SlotRef::First(idx) => self.nodes[idx].first,
            SlotRef::Second(idx) => self.nodes[idx].second,
        }
    }

    fn set(&mut self, slot: SlotRef, value: Slot) {
        match slot {
            SlotRef::Root => self.root = value,
            SlotRef::First(idx) => self.nodes[idx].first = value,
            SlotRef::Second(idx) => self.nodes[idx].second = value,
        }
    }

    fn push_node(&mut self, offset: u8, first: Slot, second: Slot) -> usize {
        self.nodes.push(SplitNode {
            offset,
            first,
            second,
        });
        self.nodes.len() - 1
    }

    /// Occupy the top-left corner of an empty region, splitting off the rest.
    fn occupy(&mut self, region: &Region, size: PackSize) {
        let same_width = size.width == region.width;
        let same_height = size.height == region.height;

        if same_width && same_height {
            self.set(region.slot, Slot::Full);
            return;
        }

        let (primary, secondary, primary_exact, secondary_exact) = match region.axis {
            Axis::Vertical => (size.width, size.height, same_width, same_height),
            Axis::Horizontal => (size.height, size.width, same_height, same_width),
        };

        let node = if secondary_exact {
            // The item spans the whole region across the split axis, so only
            // the remainder after the split offset stays free.
            self.push_node(primary, Slot::Full, Slot::Empty)
        } else {
            let remainder = if primary_exact { Slot::Full } else { Slot::Empty };
            let node = self.push_node(primary, Slot::Empty, remainder);
            let inner = self.push_node(secondary, Slot::Full, Slot::Empty);
            self.nodes[node].first = Slot::Split(inner);
            node
        };
        self.set(region.slot, Slot::Split(node));
    }
}

/// Pending region on the visit stack
#[derive(Debug, Clone, Copy)]
struct Region {
    x: u8,
    y: u8,
    width: u8,
    height: u8,
    slot: SlotRef,
    axis: Axis,
}

impl Region {
    fn fits(&self, size: PackSize) -> bool {
        size.width <= self.width && size.height <= self.height
    }
}

/// Pack `sizes` into a `width` x `height` box.
///
/// Returns the top-left corner of every rectangle, indexed like `sizes`.
/// Rectangles are placed in order of descending width (ties keep input
/// order). Within a split region the first child (left or top) is visited
/// before the second, so placements favour the origin corner.
pub fn pack(width: u8, height: u8, sizes: &[PackSize]) -> Result<Vec<PackPos>, PackError> {
    if width > MAX_PACK_EXTENT || height > MAX_PACK_EXTENT {
        return Err(PackError::InvalidBounds { width, height });
    }
    if sizes.is_empty() {
        return Err(PackError::EmptyInput);
    }
    if let Some(idx) = sizes.iter().position(|s| s.width == 0 || s.height == 0) {
        return Err(PackError::ZeroSized(idx));
    }

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    // sort_by is stable, so equal widths keep their input order
    order.sort_by(|&a, &b| sizes[b].width.cmp(&sizes[a].width));

    let mut tree = SplitTree::with_capacity(sizes.len());
    let mut positions = vec![PackPos::default(); sizes.len()];
    let mut visit_stack: Vec<Region> = Vec::with_capacity(sizes.len() * 2);

    for &idx in &order {
        let size = sizes[idx];

        if tree.root == Slot::Full {
            return Err(PackError::RootFull);
        }

        visit_stack.clear();
        visit_stack.push(Region {
            x: 0,
            y: 0,
            width,
            height,
            slot: SlotRef::Root,
            axis: Axis::Vertical,
        });

        let mut placed = None;
        while let Some(region) = visit_stack.pop() {
            if !region.fits(size) {
                continue;
            }

            match tree.get(region.slot) {
                Slot::Empty => {
                    tree.occupy(&region, size);
                    placed = Some(PackPos {
                        x: region.x,
                        y: region.y,
                    });
                    break;
                }
                // Full children are never pushed; a full root was rejected above
                Slot::Full => {}
                Slot::Split(node_idx) => {
                    let node = tree.nodes[node_idx];
                    let child_axis = region.axis.flipped();
                    let mut is_full = true;

                    // Second child goes on the stack first so the first child
                    // (left or top) is explored first.
                    if node.second != Slot::Full {
                        let second = match region.axis {
                            Axis::Vertical => Region {
                                x: region.x + node.offset,
                                y: region.y,
                                width: region.width - node.offset,
                                height: region.height,
                                slot: SlotRef::Second(node_idx),
                                axis: child_axis,
                            },
                            Axis::Horizontal => Region {
                                x: region.x,
                                y: region.y + node.offset,
                                width: region.width,
                                height: region.height - node.offset,
                                slot: SlotRef::Second(node_idx),
                                axis: child_axis,
                            },
                        };
                        if second.fits(size) {
                            visit_stack.push(second);
                        }
                        is_full = false;
                    }

                    if node.first != Slot::Full {
                        let first = match region.axis {
                            Axis::Vertical => Region {
                                width: node.offset,
                                slot: SlotRef::First(node_idx),
                                axis: child_axis,
                                ..region
                            },
                            Axis::Horizontal => Region {
                                height: node.offset,
                                slot: SlotRef::First(node_idx),
                                axis: child_axis,
                                ..region
                            },
                        };
                        if first.fits(size) {
                            visit_stack.push(first);
                        }
                        is_full = false;
                    }

                    if is_full {
                        tree.set(region.slot, Slot::Full);
                    }
                }
            }
        }

        match placed {
            Some(pos) => {
                debug!(
                    "Packed rect {} ({}x{}) at ({}, {})",
                    idx, size.width, size.height, pos.x, pos.y
                );
                positions[idx] = pos;
            }
            None => return Err(PackError::PlacementFailed(idx)),
        }
    }

    debug!(
        "Packed {} rects into {}x{} using {} split nodes",
        sizes.len(),
        width,
        height,
        tree.nodes.len()
    );

    Ok(positions)
}

/// Fraction of the bounding box covered by `sizes`
pub fn occupancy(width: u8, height: u8, sizes: &[PackSize]) -> f64 {
    let total = u32::from(width) * u32::from(height);
    if total == 0 {
        return 0.0;
    }
    let used: u32 = sizes
        .iter()
        .map(|s| u32::from(s.width) * u32::from(s.height))
        .sum();
    f64::from(used) / f64::from(total)
}
