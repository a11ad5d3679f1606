use crate::{
    pipeline::Pipeline,
    traits::{ChannelSplitter, ContourExtractor, FeatureEngine, ImagePreprocessor},
    algorithms::{
        ExternalContourExtractor,
        FixedThresholdPreprocessor,
        GeometryEngine,
        LesionSegmenter,
        MedianBlurPreprocessor,
        OtsuThresholdPreprocessor,
        WindowChannelSplitter,
    },
    types::CropWindow,
};

/// Builder for creating processing pipelines with a fluent API
pub struct PipelineBuilder {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    window: CropWindow,
    median_kernel: u32,
    fixed_threshold: Option<u8>,
    contour_extractor: Option<Box<dyn ContourExtractor>>,
    engine: Option<Box<dyn FeatureEngine>>,
    splitter: Option<Box<dyn ChannelSplitter>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            preprocessors: Vec::new(),
            window: CropWindow::default(),
            median_kernel: 5,
            fixed_threshold: None,
            contour_extractor: None,
            engine: None,
            splitter: None,
        }
    }

    /// Add a grayscale preprocessor. Once any is added, the default
    /// median blur + Otsu chain is no longer used.
    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Region of interest shared by the segmenter and the channel splitter
    pub fn with_crop_window(mut self, window: CropWindow) -> Self {
        self.window = window;
        self
    }

    /// Kernel size of the default median blur
    pub fn with_median_kernel(mut self, kernel: u32) -> Self {
        self.median_kernel = kernel;
        self
    }

    /// Binarise the blurred image at a fixed level instead of the Otsu level
    pub fn with_fixed_threshold(mut self, level: Option<u8>) -> Self {
        self.fixed_threshold = level;
        self
    }

    /// Set the contour extractor (replaces any existing one)
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.contour_extractor = Some(Box::new(extractor));
        self
    }

    /// Set the feature engine (replaces any existing one)
    pub fn set_feature_engine<F>(mut self, engine: F) -> Self
    where
        F: FeatureEngine + 'static,
    {
        self.engine = Some(Box::new(engine));
        self
    }

    /// Set the channel splitter (replaces any existing one)
    pub fn set_channel_splitter<S>(mut self, splitter: S) -> Self
    where
        S: ChannelSplitter + 'static,
    {
        self.splitter = Some(Box::new(splitter));
        self
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let preprocessors: Vec<Box<dyn ImagePreprocessor>> = if self.preprocessors.is_empty() {
            let threshold: Box<dyn ImagePreprocessor> = match self.fixed_threshold {
                Some(level) => Box::new(FixedThresholdPreprocessor { level }),
                None => Box::new(OtsuThresholdPreprocessor),
            };
            vec![
                Box::new(MedianBlurPreprocessor { kernel: self.median_kernel }),
                threshold,
            ]
        } else {
            self.preprocessors
        };

        let window = self.window;
        let contour_extractor = self.contour_extractor
            .unwrap_or_else(|| Box::new(ExternalContourExtractor));
        let engine = self.engine
            .unwrap_or_else(|| Box::new(GeometryEngine));
        let splitter = self.splitter
            .unwrap_or_else(|| Box::new(WindowChannelSplitter { window }));

        Pipeline::new(
            LesionSegmenter::new(preprocessors, window),
            contour_extractor,
            engine,
            splitter,
        )
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
