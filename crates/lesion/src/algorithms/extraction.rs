use image::GrayImage;
use imageproc::{contours::BorderType, point::Point};
use crate::{error::Result, traits::ContourExtractor, types::Contour};

/// Outermost-contour extractor built on imageproc's border following.
///
/// Holes and anything nested inside them are dropped; each remaining
/// contour is compressed to its corner vertices.
#[derive(Debug, Clone, Default)]
pub struct ExternalContourExtractor;

impl ContourExtractor for ExternalContourExtractor {
    fn extract_contours(&self, mask: &GrayImage) -> Result<Vec<Contour>> {
        let result = traced_borders(mask)
            .into_iter()
            .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
            .map(|contour| Contour::new(compress_collinear(&contour.points)))
            .collect();

        Ok(result)
    }
}

/// Every traced boundary point, no filtering or compression
#[derive(Debug, Clone, Default)]
pub struct RawContourExtractor;

impl ContourExtractor for RawContourExtractor {
    fn extract_contours(&self, mask: &GrayImage) -> Result<Vec<Contour>> {
        Ok(traced_borders(mask)
            .into_iter()
            .map(|contour| Contour::new(contour.points))
            .collect())
    }
}

/// Border following over the mask surrounded by a one-pixel background
/// frame, so regions touching the image edge are traced as outer borders.
/// Points are returned in the coordinates of `mask`.
fn traced_borders(mask: &GrayImage) -> Vec<imageproc::contours::Contour<i32>> {
    let (width, height) = mask.dimensions();
    let mut padded = GrayImage::new(width + 2, height + 2);
    image::imageops::replace(&mut padded, mask, 1, 1);

    let mut contours = imageproc::contours::find_contours::<i32>(&padded);
    for contour in &mut contours {
        for point in &mut contour.points {
            point.x -= 1;
            point.y -= 1;
        }
    }
    contours
}

/// Drop points that sit in the middle of a straight run of a closed curve.
///
/// A point is kept when the incoming and outgoing directions differ, so
/// horizontal, vertical and diagonal runs collapse to their endpoints and a
/// curve that doubles back keeps its turning point.
pub fn compress_collinear(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let kept: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let curr = points[i];
            let next = points[(i + 1) % n];
            let (ax, ay) = (curr.x - prev.x, curr.y - prev.y);
            let (bx, by) = (next.x - curr.x, next.y - curr.y);
            let cross = ax * by - ay * bx;
            let dot = ax * bx + ay * by;
            cross != 0 || dot <= 0
        })
        .map(|i| points[i])
        .collect();

    // no turning point at all
    if kept.is_empty() {
        return points.to_vec();
    }
    kept
}
