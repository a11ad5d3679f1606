pub mod builder;

use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use tracing::{debug, info_span, warn};
use crate::{
    algorithms::LesionSegmenter,
    error::Result,
    record::{ChannelPlanes, FeatureRecord, GeometricFeatures, Label},
    traits::{ChannelSplitter, ContourExtractor, FeatureEngine, Segmenter},
    types::Contour,
};

/// Stage at which a sample lost some of its features
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, IntoStaticStr, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Fetch,
    Segmentation,
    Contours,
    Channels,
}

/// Why a row carries undefined values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SampleFailure {
    pub image_id: String,
    pub stage: Stage,
    pub reason: String,
}

/// Segmentation and feature extraction for one image at a time
pub struct Pipeline {
    segmenter: LesionSegmenter,
    contour_extractor: Box<dyn ContourExtractor>,
    engine: Box<dyn FeatureEngine>,
    splitter: Box<dyn ChannelSplitter>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Create a new pipeline with the given components
    pub fn new(
        segmenter: LesionSegmenter,
        contour_extractor: Box<dyn ContourExtractor>,
        engine: Box<dyn FeatureEngine>,
        splitter: Box<dyn ChannelSplitter>,
    ) -> Self {
        Self {
            segmenter,
            contour_extractor,
            engine,
            splitter,
        }
    }

    /// Binary lesion mask of a raw image
    pub fn segment(&self, image: &RgbImage) -> Result<GrayImage> {
        self.segmenter.segment(image)
    }

    pub fn contours(&self, mask: &GrayImage) -> Result<Vec<Contour>> {
        self.contour_extractor.extract_contours(mask)
    }

    /// Shape features of a mask
    pub fn measure(&self, mask: &GrayImage) -> Result<GeometricFeatures> {
        let contours = self.contours(mask)?;
        Ok(self.engine.measure(mask, &contours))
    }

    pub fn split_channels(&self, image: &RgbImage) -> Result<ChannelPlanes> {
        self.splitter.split(image)
    }

    /// Build the full record for one image.
    ///
    /// Never fails: a stage error leaves the fields it would have produced
    /// undefined and is reported alongside the record.
    pub fn process(
        &self,
        image_id: &str,
        label: Label,
        image: &RgbImage,
    ) -> (FeatureRecord, Vec<SampleFailure>) {
        let _span = info_span!("sample", image_id).entered();

        let mut record = FeatureRecord::undefined(image_id, label);
        let mut failures = Vec::new();
        let mut fail = |stage: Stage, reason: String| {
            warn!(%stage, %reason, "sample degraded");
            failures.push(SampleFailure {
                image_id: image_id.to_string(),
                stage,
                reason,
            });
        };

        match self.segment(image) {
            Ok(mask) => match self.measure(&mask) {
                Ok(features) => {
                    debug!(?features, "measured");
                    record = record.with_geometry(mask, features);
                }
                Err(err) => {
                    record.non_zeros = Some(crate::algorithms::count_foreground(&mask));
                    record.segmented_image = Some(mask.into());
                    fail(Stage::Contours, err.to_string());
                }
            },
            Err(err) => fail(Stage::Segmentation, err.to_string()),
        }

        match self.split_channels(image) {
            Ok(channels) => record = record.with_channels(channels),
            Err(err) => fail(Stage::Channels, err.to_string()),
        }

        (record, failures)
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        let window = self.segmenter.window();
        format!(
            "Pipeline: {} preprocessors, crop rows {}..{} cols {}..{}",
            self.segmenter.stage_count(),
            window.top,
            window.bottom,
            window.left,
            window.right
        )
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        builder::PipelineBuilder::new().build()
    }
}
