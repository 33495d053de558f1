use super::{PackPos, PackSize};

/// A placed rectangle in packing units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl PackRect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a packed item at its placement
    pub fn placed(pos: PackPos, size: PackSize) -> Self {
        Self::new(
            u16::from(pos.x),
            u16::from(pos.y),
            u16::from(size.width),
            u16::from(size.height),
        )
    }

    pub fn right(&self) -> u16 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u16 {
        self.y + self.height
    }

    pub fn area(&self) -> u32 {
        u32::from(self.width) * u32::from(self.height)
    }

    /// Check if this rectangle intersects with another
    pub fn intersects(&self, other: &PackRect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Check if this rectangle fully contains another
    pub fn contains(&self, other: &PackRect) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = PackRect::new(0, 0, 4, 1);
        let b = PackRect::new(0, 1, 4, 1);
        let c = PackRect::new(4, 0, 1, 1);

        assert!(!a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.intersects(&PackRect::new(3, 0, 2, 2)));
    }

    #[test]
    fn test_placed_bounds() {
        let rect = PackRect::placed(
            PackPos { x: 120, y: 64 },
            PackSize {
                width: 8,
                height: 64,
            },
        );

        assert_eq!(rect.right(), 128);
        assert_eq!(rect.bottom(), 128);
        assert_eq!(rect.area(), 512);
        assert!(PackRect::new(0, 0, 128, 128).contains(&rect));
        assert!(!PackRect::new(0, 0, 127, 128).contains(&rect));
    }
}
