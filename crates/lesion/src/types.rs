use geo_types::{Coord, LineString, Polygon};
use imageproc::point::Point;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{LesionError, Result};

/// Fixed rectangular region of interest, as half-open pixel ranges.
///
/// The default window keeps rows `60..400` and columns `50..550`, which on
/// the dermoscopy frames excludes the vignetted border and the rulers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CropWindow {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Default for CropWindow {
    fn default() -> Self {
        Self {
            top: 60,
            bottom: 400,
            left: 50,
            right: 550,
        }
    }
}

impl CropWindow {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Fails with [`LesionError::EmptyCropWindow`] unless `top < bottom` and
    /// `left < right`.
    pub fn validate(&self) -> Result<()> {
        if self.top >= self.bottom || self.left >= self.right {
            return Err(LesionError::EmptyCropWindow {
                top: self.top,
                bottom: self.bottom,
                left: self.left,
                right: self.right,
            });
        }
        Ok(())
    }

    /// Fails with [`LesionError::OutOfBounds`] when an image of the given
    /// size cannot hold the whole window, or when the window is empty.
    pub fn check(&self, width: u32, height: u32) -> Result<()> {
        self.validate()?;
        if width < self.right || height < self.bottom {
            return Err(LesionError::OutOfBounds {
                width,
                height,
                required_width: self.right,
                required_height: self.bottom,
            });
        }
        Ok(())
    }
}

/// A closed boundary curve traced around a foreground region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Convert to a geo-types polygon (the ring is closed implicitly)
    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .points
            .iter()
            .map(|p| Coord {
                x: p.x as f64,
                y: p.y as f64,
            })
            .collect();

        Polygon::new(LineString::new(coords), vec![])
    }

    /// Enclosed area by the shoelace formula
    pub fn area(&self) -> f64 {
        use geo::Area;
        if self.points.len() < 3 {
            return 0.0;
        }
        self.to_geo_polygon().unsigned_area()
    }

    /// Arc length of the closed polygon
    pub fn perimeter(&self) -> f64 {
        use geo::EuclideanLength;
        if self.points.len() < 2 {
            return 0.0;
        }
        self.to_geo_polygon().exterior().euclidean_length()
    }

    /// Number of integer lattice points lying on the polygon's edges.
    pub fn boundary_lattice_points(&self) -> u64 {
        if self.points.len() < 2 {
            return self.points.len() as u64;
        }
        self.points
            .iter()
            .zip(self.points.iter().cycle().skip(1))
            .map(|(a, b)| gcd((b.x - a.x).unsigned_abs(), (b.y - a.y).unsigned_abs()) as u64)
            .sum()
    }

    /// Pixels covered by the polygon, interior plus boundary, by Pick's
    /// theorem. Only meaningful for a simple polygon whose region has no
    /// one-pixel-wide spurs.
    pub fn enclosed_pixel_count(&self) -> u64 {
        let boundary = self.boundary_lattice_points();
        if self.points.len() < 3 {
            return boundary;
        }
        (self.area() + boundary as f64 / 2.0 + 1.0).round() as u64
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Raw spatial moments of a contour polygon, up to second order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m11: f64,
    pub m20: f64,
    pub m02: f64,
}

impl Moments {
    /// `(m10 / m00, m01 / m00)`, or `None` for a zero-area contour
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.m00 == 0.0 {
            return None;
        }
        Some((self.m10 / self.m00, self.m01 / self.m00))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: i32) -> Contour {
        Contour::new(vec![
            Point::new(0, 0),
            Point::new(side, 0),
            Point::new(side, side),
            Point::new(0, side),
        ])
    }

    #[test]
    fn test_crop_window_bounds() {
        let window = CropWindow::default();
        assert_eq!(window.width(), 500);
        assert_eq!(window.height(), 340);
        assert!(window.check(600, 450).is_ok());
        assert!(window.check(550, 400).is_ok());

        match window.check(549, 450) {
            Err(LesionError::OutOfBounds { required_width, required_height, .. }) => {
                assert_eq!(required_width, 550);
                assert_eq!(required_height, 400);
            }
            other => panic!("expected OutOfBounds, got {:?}", other),
        }
        assert!(window.check(600, 399).is_err());
    }

    #[test]
    fn test_inverted_or_empty_window_is_rejected() {
        let inverted = CropWindow { top: 10, bottom: 5, left: 20, right: 10 };
        assert!(matches!(
            inverted.check(50, 50),
            Err(LesionError::EmptyCropWindow { top: 10, bottom: 5, .. })
        ));

        let flat = CropWindow { top: 5, bottom: 5, left: 0, right: 10 };
        assert!(matches!(flat.validate(), Err(LesionError::EmptyCropWindow { .. })));
        assert!(CropWindow::default().validate().is_ok());
    }

    #[test]
    fn test_square_area_and_perimeter() {
        let contour = square(10);
        assert!((contour.area() - 100.0).abs() < 1e-9);
        assert!((contour.perimeter() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_contours() {
        let empty = Contour::new(vec![]);
        assert_eq!(empty.area(), 0.0);
        assert_eq!(empty.perimeter(), 0.0);

        let point = Contour::new(vec![Point::new(4, 4)]);
        assert_eq!(point.area(), 0.0);
        assert_eq!(point.perimeter(), 0.0);
        assert_eq!(point.enclosed_pixel_count(), 1);

        // A segment traced forth and back
        let line = Contour::new(vec![Point::new(0, 0), Point::new(5, 0)]);
        assert!((line.perimeter() - 10.0).abs() < 1e-9);
        assert_eq!(line.area(), 0.0);
    }

    #[test]
    fn test_enclosed_pixel_count_of_square() {
        // Pixel centres 0..=10 on both axes
        assert_eq!(square(10).boundary_lattice_points(), 40);
        assert_eq!(square(10).enclosed_pixel_count(), 121);
    }

    #[test]
    fn test_centroid_requires_area() {
        assert_eq!(Moments::default().centroid(), None);
        let moments = Moments {
            m00: 4.0,
            m10: 8.0,
            m01: 12.0,
            ..Default::default()
        };
        assert_eq!(moments.centroid(), Some((2.0, 3.0)));
    }
}
