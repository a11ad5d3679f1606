use std::{fs, path::{Path, PathBuf}};

use lesion::{CropWindow, Pipeline};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use crate::error::{Result, StoreError};

/// Serialized layout of the persisted feature table
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TableFormat {
    Json,
    #[default]
    Bincode,
}

/// Segmentation parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct SegmentationConfig {
    #[schemars(range(min = 1, max = 31))]
    pub median_kernel: u32,
    /// Fixed binarisation level; the Otsu level is used when unset
    pub fixed_threshold: Option<u8>,
    pub crop: CropWindow,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            median_kernel: 5,
            fixed_threshold: None,
            crop: CropWindow::default(),
        }
    }
}

impl SegmentationConfig {
    /// Reject settings that could only produce undefined rows
    pub fn validate(&self) -> Result<()> {
        if self.median_kernel == 0 || self.median_kernel % 2 == 0 {
            return Err(StoreError::InvalidConfig(format!(
                "median_kernel must be odd and positive, got {}",
                self.median_kernel
            )));
        }
        self.crop.validate()?;
        Ok(())
    }
}

/// Batch configuration: where the data lives and how to process it
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory backing the object store
    pub store_root: PathBuf,
    pub source_bucket: String,
    pub processed_bucket: String,
    /// Metadata CSV key in the source bucket
    pub metadata_key: String,
    /// Prefix of `{image_id}.jpg` objects in the source bucket
    pub images_dir: String,
    /// Prefix for segmented mask PNGs in the processed bucket
    pub segmented_dir: String,
    /// Feature table key in the processed bucket
    pub table_key: String,
    pub table_format: TableFormat,
    pub save_masks: bool,
    /// Resample each class to this many rows (with replacement)
    pub samples_per_class: Option<usize>,
    pub seed: u64,
    pub segmentation: SegmentationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from("store"),
            source_bucket: "mlop-train-data-01".to_string(),
            processed_bucket: "mlop-train-data-01".to_string(),
            metadata_key: "data/HAM10000_metadata.csv".to_string(),
            images_dir: "data/images".to_string(),
            segmented_dir: "processed_data/segmented_images".to_string(),
            table_key: "processed_data/features.bin".to_string(),
            table_format: TableFormat::Bincode,
            save_masks: true,
            samples_per_class: None,
            seed: 42,
            segmentation: SegmentationConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Assemble the processing pipeline described by this configuration
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::builder()
            .with_crop_window(self.segmentation.crop)
            .with_median_kernel(self.segmentation.median_kernel)
            .with_fixed_threshold(self.segmentation.fixed_threshold)
            .build()
    }

    /// Get the JSON schema of the configuration file
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(PipelineConfig)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.segmentation.validate()
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(StoreError::UnsupportedFileFormat),
        }
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Convert configuration to JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self)?)
    }
}
