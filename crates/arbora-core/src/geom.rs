//! Canvas-space geometry shared with the engine.

pub type Point = euclid::Point2D<f64, euclid::UnknownUnit>;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}
