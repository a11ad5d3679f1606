use image::{GrayImage, RgbImage};
use tracing::debug;
use crate::{
    error::{LesionError, Result},
    traits::{ImagePreprocessor, Segmenter},
    types::CropWindow,
};

/// Median blur over a square `kernel x kernel` neighbourhood
#[derive(Debug, Clone)]
pub struct MedianBlurPreprocessor {
    pub kernel: u32,
}

impl Default for MedianBlurPreprocessor {
    fn default() -> Self {
        Self { kernel: 5 }
    }
}

impl ImagePreprocessor for MedianBlurPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        if self.kernel == 0 || self.kernel % 2 == 0 {
            return Err(LesionError::ImageProcessing(format!(
                "median kernel must be odd and positive, got {}",
                self.kernel
            )));
        }
        let radius = self.kernel / 2;
        Ok(imageproc::filter::median_filter(image, radius, radius))
    }
}

/// Global Otsu thresholding: pixels above the level become 255, others 0
#[derive(Debug, Clone, Default)]
pub struct OtsuThresholdPreprocessor;

impl ImagePreprocessor for OtsuThresholdPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let level = imageproc::contrast::otsu_level(image);
        debug!(level, "otsu level");
        Ok(imageproc::contrast::threshold(image, level))
    }
}

/// Fixed-level binarisation, used in place of Otsu when the level is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedThresholdPreprocessor {
    pub level: u8,
}

impl ImagePreprocessor for FixedThresholdPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        Ok(imageproc::contrast::threshold(image, self.level))
    }
}

/// Crop the region of interest out of an already-checked image.
pub fn crop_gray(image: &GrayImage, window: &CropWindow) -> Result<GrayImage> {
    window.check(image.width(), image.height())?;
    Ok(image::imageops::crop_imm(image, window.left, window.top, window.width(), window.height())
        .to_image())
}

pub fn crop_rgb(image: &RgbImage, window: &CropWindow) -> Result<RgbImage> {
    window.check(image.width(), image.height())?;
    Ok(image::imageops::crop_imm(image, window.left, window.top, window.width(), window.height())
        .to_image())
}

/// Grayscale, run the preprocessors, crop to the window, then invert so
/// the (dark) lesion ends up as the 255 foreground.
pub struct LesionSegmenter {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    window: CropWindow,
}

impl LesionSegmenter {
    pub fn new(preprocessors: Vec<Box<dyn ImagePreprocessor>>, window: CropWindow) -> Self {
        Self {
            preprocessors,
            window,
        }
    }

    pub fn window(&self) -> &CropWindow {
        &self.window
    }

    pub fn stage_count(&self) -> usize {
        self.preprocessors.len()
    }
}

impl Default for LesionSegmenter {
    fn default() -> Self {
        Self::new(
            vec![
                Box::new(MedianBlurPreprocessor::default()),
                Box::new(OtsuThresholdPreprocessor),
            ],
            CropWindow::default(),
        )
    }
}

impl Segmenter for LesionSegmenter {
    fn segment(&self, image: &RgbImage) -> Result<GrayImage> {
        self.window.check(image.width(), image.height())?;

        let mut processed = image::imageops::grayscale(image);
        for preprocessor in &self.preprocessors {
            processed = preprocessor.preprocess(&processed)?;
        }

        let mut mask = crop_gray(&processed, &self.window)?;
        image::imageops::invert(&mut mask);
        Ok(mask)
    }
}
