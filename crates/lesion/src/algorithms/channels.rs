use image::{GrayImage, Rgb, RgbImage};
use crate::{
    algorithms::preprocessing::crop_rgb,
    error::{LesionError, Result},
    record::ChannelPlanes,
    traits::ChannelSplitter,
    types::CropWindow,
};

/// Crops with the segmentation window and separates the colour planes.
#[derive(Debug, Clone, Default)]
pub struct WindowChannelSplitter {
    pub window: CropWindow,
}

impl ChannelSplitter for WindowChannelSplitter {
    fn split(&self, image: &RgbImage) -> Result<ChannelPlanes> {
        let cropped = crop_rgb(image, &self.window)?;
        Ok(split_channels(&cropped))
    }
}

/// Separate an RGB image into R, G and B planes, values untouched
pub fn split_channels(image: &RgbImage) -> ChannelPlanes {
    let (width, height) = image.dimensions();
    let plane = |c: usize| GrayImage::from_fn(width, height, |x, y| image::Luma([image.get_pixel(x, y)[c]]));

    ChannelPlanes {
        red: plane(0),
        green: plane(1),
        blue: plane(2),
    }
}

/// Inverse of [`split_channels`]
pub fn merge_channels(planes: &ChannelPlanes) -> Result<RgbImage> {
    let dims = planes.red.dimensions();
    if planes.green.dimensions() != dims || planes.blue.dimensions() != dims {
        return Err(LesionError::ImageProcessing(format!(
            "channel planes differ in size: {:?}, {:?}, {:?}",
            dims,
            planes.green.dimensions(),
            planes.blue.dimensions()
        )));
    }

    Ok(RgbImage::from_fn(dims.0, dims.1, |x, y| {
        Rgb([
            planes.red.get_pixel(x, y)[0],
            planes.green.get_pixel(x, y)[0],
            planes.blue.get_pixel(x, y)[0],
        ])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x * 7 + y * 3) % 256) as u8])
        })
    }

    #[test]
    fn test_split_then_merge_reconstructs_crop() {
        let image = gradient(600, 450);
        let splitter = WindowChannelSplitter::default();
        let planes = splitter.split(&image).unwrap();

        assert_eq!(planes.red.dimensions(), (500, 340));
        assert_eq!(planes.red.get_pixel(0, 0)[0], 50);
        assert_eq!(planes.green.get_pixel(0, 0)[0], 60);

        let rejoined = merge_channels(&planes).unwrap();
        let expected = crop_rgb(&image, &CropWindow::default()).unwrap();
        assert_eq!(rejoined, expected);
    }

    #[test]
    fn test_split_rejects_small_image() {
        let image = gradient(100, 100);
        assert!(matches!(
            WindowChannelSplitter::default().split(&image),
            Err(LesionError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_merge_rejects_mismatched_planes() {
        let planes = ChannelPlanes {
            red: GrayImage::new(4, 4),
            green: GrayImage::new(4, 4),
            blue: GrayImage::new(4, 3),
        };
        assert!(merge_channels(&planes).is_err());
    }
}
