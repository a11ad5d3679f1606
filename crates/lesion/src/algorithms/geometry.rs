//! Shape features of a lesion mask: perimeter, pixel area, circularity and
//! the two principal-axis asymmetry scores.

use std::f64::consts::PI;

use image::GrayImage;
use tracing::debug;
use crate::{
    error::{LesionError, Result},
    record::GeometricFeatures,
    traits::FeatureEngine,
    types::{Contour, Moments},
};

/// Asymmetry of a contour about its two symmetry axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Asymmetry {
    pub main: f64,
    pub secondary: f64,
}

/// Spatial moments of the polygon enclosed by `contour`, integrated over
/// its area with Green's theorem.
///
/// The sign is normalised so that `m00` is the (non-negative) enclosed area
/// whatever the traversal direction.
pub fn contour_moments(contour: &Contour) -> Moments {
    let points = &contour.points;
    if points.len() < 3 {
        return Moments::default();
    }

    let mut acc = Moments::default();
    for (p, q) in points.iter().zip(points.iter().cycle().skip(1)) {
        let (x0, y0) = (p.x as f64, p.y as f64);
        let (x1, y1) = (q.x as f64, q.y as f64);
        let cross = x0 * y1 - x1 * y0;

        acc.m00 += cross;
        acc.m10 += cross * (x0 + x1);
        acc.m01 += cross * (y0 + y1);
        acc.m20 += cross * (x0 * x0 + x0 * x1 + x1 * x1);
        acc.m11 += cross * (x0 * (2.0 * y0 + y1) + x1 * (y0 + 2.0 * y1));
        acc.m02 += cross * (y0 * y0 + y0 * y1 + y1 * y1);
    }

    let sign = if acc.m00 < 0.0 { -1.0 } else { 1.0 };
    Moments {
        m00: sign * acc.m00 / 2.0,
        m10: sign * acc.m10 / 6.0,
        m01: sign * acc.m01 / 6.0,
        m11: sign * acc.m11 / 24.0,
        m20: sign * acc.m20 / 12.0,
        m02: sign * acc.m02 / 12.0,
    }
}

/// Main and secondary asymmetry from the second-order central moments.
///
/// Fails with [`LesionError::DegenerateMoment`] when the contour encloses no
/// area or its central second moments cancel out.
pub fn asymmetry(moments: &Moments) -> Result<Asymmetry> {
    let (cx, cy) = moments
        .centroid()
        .ok_or_else(|| LesionError::DegenerateMoment("m00 is zero".to_string()))?;

    let mu11 = moments.m11 - cx * moments.m01;
    let mu20 = moments.m20 - cx * moments.m10;
    let mu02 = moments.m02 - cy * moments.m01;

    let spread = mu20 + mu02;
    if spread == 0.0 {
        return Err(LesionError::DegenerateMoment("mu20 + mu02 is zero".to_string()));
    }

    let about = |theta: f64| {
        let (sin, cos) = theta.sin_cos();
        (mu20 * sin * sin - 2.0 * mu11 * sin * cos + mu02 * cos * cos).abs() / spread
    };

    let theta1 = 0.5 * (2.0 * mu11).atan2(mu20 - mu02);
    let theta2 = 0.5 * (2.0 * mu11).atan2(-(mu20 - mu02));

    Ok(Asymmetry {
        main: about(theta1),
        secondary: about(theta2),
    })
}

/// `4πA / P²`, undefined for a zero perimeter
pub fn circularity(area: f64, perimeter: f64) -> Option<f64> {
    if perimeter > 0.0 {
        Some(4.0 * PI * area / (perimeter * perimeter))
    } else {
        None
    }
}

/// Number of non-zero pixels in the mask
pub fn count_foreground(mask: &GrayImage) -> u64 {
    mask.pixels().filter(|p| p[0] != 0).count() as u64
}

/// The contour enclosing the largest area; the first one wins a tie.
pub fn largest_contour(contours: &[Contour]) -> Result<&Contour> {
    let mut best: Option<(&Contour, f64)> = None;
    for contour in contours {
        let area = contour.area();
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((contour, area)),
        }
    }
    best.map(|(contour, _)| contour)
        .ok_or(LesionError::NoContourFound)
}

/// Measures the canonical (largest) contour of a mask.
#[derive(Debug, Clone, Default)]
pub struct GeometryEngine;

impl FeatureEngine for GeometryEngine {
    fn measure(&self, mask: &GrayImage, contours: &[Contour]) -> GeometricFeatures {
        let non_zeros = count_foreground(mask);

        let canonical = match largest_contour(contours) {
            Ok(contour) => contour,
            Err(err) => {
                debug!(%err, "no canonical contour");
                return GeometricFeatures {
                    perimeter: 0.0,
                    non_zeros,
                    circularity: None,
                    main_assymetry: None,
                    secondary_assymetry: None,
                };
            }
        };

        let perimeter = canonical.perimeter();
        let circularity = circularity(canonical.area(), perimeter);

        let (main_assymetry, secondary_assymetry) = match asymmetry(&contour_moments(canonical)) {
            Ok(asym) => (Some(asym.main), Some(asym.secondary)),
            Err(err) => {
                debug!(%err, "asymmetry undefined");
                (None, None)
            }
        };

        GeometricFeatures {
            perimeter,
            non_zeros,
            circularity,
            main_assymetry,
            secondary_assymetry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{algorithms::ExternalContourExtractor, traits::ContourExtractor};
    use image::Luma;
    use imageproc::{
        drawing::{draw_filled_circle_mut, draw_filled_rect_mut},
        point::Point,
        rect::Rect,
    };

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {} ± {}, got {}",
            expected,
            tol,
            actual
        );
    }

    fn measure(mask: &GrayImage) -> GeometricFeatures {
        let contours = ExternalContourExtractor.extract_contours(mask).unwrap();
        GeometryEngine.measure(mask, &contours)
    }

    fn rect_contour(x: i32, y: i32, w: i32, h: i32) -> Contour {
        Contour::new(vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ])
    }

    #[test]
    fn test_rectangle_moments_match_closed_form() {
        // Rectangle [0,4] x [0,2]
        let moments = contour_moments(&rect_contour(0, 0, 4, 2));
        assert_close(moments.m00, 8.0, 1e-9);
        assert_close(moments.m10, 16.0, 1e-9); // area * cx
        assert_close(moments.m01, 8.0, 1e-9); // area * cy
        assert_close(moments.m20, 4.0 * 4.0 * 4.0 * 2.0 / 3.0, 1e-9);
        assert_close(moments.m02, 2.0 * 2.0 * 2.0 * 4.0 / 3.0, 1e-9);
        assert_close(moments.m11, 16.0, 1e-9);
    }

    #[test]
    fn test_moments_ignore_orientation() {
        let forward = rect_contour(3, 5, 7, 2);
        let mut backward = forward.clone();
        backward.points.reverse();
        assert_eq!(contour_moments(&forward), contour_moments(&backward));
    }

    #[test]
    fn test_circularity_undefined_without_perimeter() {
        assert_eq!(circularity(0.0, 0.0), None);
        assert_close(circularity(100.0, 40.0).unwrap(), PI / 4.0, 1e-12);
    }

    #[test]
    fn test_empty_mask_is_all_undefined() {
        let features = measure(&GrayImage::new(64, 64));
        assert_eq!(features.perimeter, 0.0);
        assert_eq!(features.non_zeros, 0);
        assert_eq!(features.circularity, None);
        assert_eq!(features.main_assymetry, None);
        assert_eq!(features.secondary_assymetry, None);
    }

    #[test]
    fn test_single_pixel_has_degenerate_moments() {
        let mut mask = GrayImage::new(10, 10);
        mask.put_pixel(4, 4, Luma([255]));
        let features = measure(&mask);
        assert_eq!(features.non_zeros, 1);
        assert_eq!(features.perimeter, 0.0);
        assert_eq!(features.circularity, None);
        assert_eq!(features.main_assymetry, None);
        assert!(matches!(
            asymmetry(&Moments::default()),
            Err(LesionError::DegenerateMoment(_))
        ));
    }

    #[test]
    fn test_filled_circle_is_nearly_circular() {
        let mut mask = GrayImage::new(200, 200);
        draw_filled_circle_mut(&mut mask, (100, 100), 60, Luma([255u8]));
        let features = measure(&mask);
        let circ = features.circularity.unwrap();
        // 8-connected boundary tracing overestimates the arc length by ~5%
        assert!(circ > 0.85 && circ <= 1.05, "circularity {}", circ);

        let main = features.main_assymetry.unwrap();
        let secondary = features.secondary_assymetry.unwrap();
        assert!((main - secondary).abs() < 0.05);
    }

    #[test]
    fn test_square_is_balanced() {
        let mut mask = GrayImage::new(100, 100);
        draw_filled_rect_mut(&mut mask, Rect::at(30, 30).of_size(40, 40), Luma([255u8]));
        let features = measure(&mask);

        assert_close(features.perimeter, 156.0, 1e-9);
        assert_close(features.circularity.unwrap(), PI / 4.0, 1e-9);

        let main = features.main_assymetry.unwrap();
        let secondary = features.secondary_assymetry.unwrap();
        assert_close(main - secondary, 0.0, 1e-9);
        assert_close(main, 0.5, 1e-9);
    }

    #[test]
    fn test_elongated_rectangle_is_asymmetric() {
        let mut mask = GrayImage::new(120, 60);
        draw_filled_rect_mut(&mut mask, Rect::at(20, 20).of_size(80, 20), Luma([255u8]));
        let features = measure(&mask);

        let main = features.main_assymetry.unwrap();
        let secondary = features.secondary_assymetry.unwrap();
        assert!(main < 0.1, "main {}", main);
        assert!(secondary > 0.9, "secondary {}", secondary);
        assert_close(main + secondary, 1.0, 1e-9);
    }

    #[test]
    fn test_largest_contour_wins() {
        let mut mask = GrayImage::new(200, 100);
        draw_filled_rect_mut(&mut mask, Rect::at(5, 5).of_size(10, 10), Luma([255u8]));
        draw_filled_rect_mut(&mut mask, Rect::at(50, 20).of_size(60, 40), Luma([255u8]));
        let features = measure(&mask);

        // Perimeter of the big rectangle only, pixel count covers both
        assert_close(features.perimeter, 2.0 * (59.0 + 39.0), 1e-9);
        assert_eq!(features.non_zeros, 100 + 2400);
    }

    #[test]
    fn test_largest_contour_tie_keeps_first() {
        let first = rect_contour(0, 0, 5, 5);
        let second = rect_contour(10, 10, 5, 5);
        let contours = vec![first.clone(), second];
        assert_eq!(largest_contour(&contours).unwrap(), &first);
        assert!(matches!(largest_contour(&[]), Err(LesionError::NoContourFound)));
    }

    #[test]
    fn test_pixel_count_agrees_with_contour() {
        let mut mask = GrayImage::new(200, 200);
        draw_filled_rect_mut(&mut mask, Rect::at(10, 20).of_size(70, 30), Luma([255u8]));
        draw_filled_circle_mut(&mut mask, (140, 120), 40, Luma([255u8]));

        let contours = ExternalContourExtractor.extract_contours(&mask).unwrap();
        assert_eq!(contours.len(), 2);
        let via_contours: u64 = contours.iter().map(Contour::enclosed_pixel_count).sum();
        assert_eq!(via_contours, count_foreground(&mask));
    }
}
