//! Mapping between layout space (depth, cross) and canvas coordinates.
//!
//! Layouts are computed with depth growing away from the root and the cross axis running across
//! siblings. The four orientations swap and reverse axes so that `Deg0` puts the root at the
//! top and every further step rotates the drawing by 90° clockwise.

use arbora_core::Orientation;
use arbora_core::geom::{Point, point};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisFrame {
    pub orientation: Orientation,
    pub width: f64,
    pub height: f64,
}

impl AxisFrame {
    pub fn new(orientation: Orientation, width: f64, height: f64) -> Self {
        Self {
            orientation,
            width,
            height,
        }
    }

    /// Extent of the canvas along the depth axis.
    pub fn depth_length(&self) -> f64 {
        if self.orientation.depth_axis_is_vertical() {
            self.height
        } else {
            self.width
        }
    }

    /// Extent of the canvas along the cross axis.
    pub fn cross_length(&self) -> f64 {
        if self.orientation.depth_axis_is_vertical() {
            self.width
        } else {
            self.height
        }
    }

    pub fn project(&self, depth: f64, cross: f64) -> Point {
        let (w, h) = (self.width, self.height);
        match self.orientation {
            Orientation::Deg0 => point(cross, depth),
            Orientation::Deg90 => point(w - depth, cross),
            Orientation::Deg180 => point(w - cross, h - depth),
            Orientation::Deg270 => point(depth, h - cross),
        }
    }

    /// The frame of the same canvas turned by 90° clockwise (width and height swap).
    pub fn rotated_cw(&self) -> Self {
        Self::new(self.orientation.rotated_cw(), self.height, self.width)
    }

    /// Where a point of this frame lands on the canvas of `rotated_cw()`.
    pub fn rotate_point_cw(&self, p: Point) -> Point {
        point(self.height - p.y, p.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_side_follows_orientation() {
        let cases = [
            (Orientation::Deg0, point(150.0, 0.0)),
            (Orientation::Deg90, point(300.0, 100.0)),
            (Orientation::Deg180, point(150.0, 200.0)),
            (Orientation::Deg270, point(0.0, 100.0)),
        ];
        for (o, expected) in cases {
            let frame = AxisFrame::new(o, 300.0, 200.0);
            assert_eq!(frame.project(0.0, frame.cross_length() / 2.0), expected);
        }
    }

    #[test]
    fn rotating_the_frame_rotates_its_points() {
        let frame = AxisFrame::new(Orientation::Deg0, 300.0, 200.0);
        let mut f = frame;
        for _ in 0..3 {
            let next = f.rotated_cw();
            let p = f.project(30.0, 50.0);
            assert_eq!(f.rotate_point_cw(p), next.project(30.0, 50.0));
            f = next;
        }
        assert_eq!(f.rotated_cw(), frame);
    }
}
