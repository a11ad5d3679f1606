use image::{GrayImage, RgbImage};
use crate::{
    error::Result,
    record::{ChannelPlanes, GeometricFeatures},
    types::Contour,
};

/// Trait for grayscale preprocessing steps (e.g., blur, threshold)
pub trait ImagePreprocessor: Send + Sync {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;
}

/// Trait for turning a raw colour image into a binary lesion mask
pub trait Segmenter: Send + Sync {
    fn segment(&self, image: &RgbImage) -> Result<GrayImage>;
}

/// Trait for contour extraction algorithms
pub trait ContourExtractor: Send + Sync {
    /// Extract contours from a binary mask; an empty mask yields no contours
    fn extract_contours(&self, mask: &GrayImage) -> Result<Vec<Contour>>;
}

/// Trait for shape measurement over a mask and its contours
pub trait FeatureEngine: Send + Sync {
    fn measure(&self, mask: &GrayImage, contours: &[Contour]) -> GeometricFeatures;
}

/// Trait for photometric plane extraction
pub trait ChannelSplitter: Send + Sync {
    fn split(&self, image: &RgbImage) -> Result<ChannelPlanes>;
}
