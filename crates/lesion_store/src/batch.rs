use std::collections::BTreeMap;

use image::RgbImage;
use lesion::{BatchReport, FeatureTableBuilder, TableSummary};
use tracing::{info, info_span, warn};
use crate::{
    config::PipelineConfig,
    error::Result,
    metadata::{impute_missing_age, parse_metadata},
    object_store::ObjectStore,
    persist::{load_table, save_mask, save_table},
    sampling::balance,
};

/// Raw dermatoscopic images stored as `{images_dir}/{image_id}.jpg`
pub struct ImageSource<'a> {
    store: &'a dyn ObjectStore,
    bucket: String,
    images_dir: String,
}

impl<'a> ImageSource<'a> {
    pub fn new(store: &'a dyn ObjectStore, bucket: impl Into<String>, images_dir: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            images_dir: images_dir.into(),
        }
    }

    pub fn key(&self, image_id: &str) -> String {
        format!("{}/{}.jpg", self.images_dir.trim_end_matches('/'), image_id)
    }

    /// Fetch and decode one image as RGB
    pub fn fetch(&self, image_id: &str) -> Result<RgbImage> {
        let bytes = self.store.get(&self.bucket, &self.key(image_id))?;
        Ok(image::load_from_memory(&bytes)?.to_rgb8())
    }
}

/// Build the feature table for every sample listed in the metadata and
/// persist it, together with the masks when enabled.
///
/// Images that cannot be fetched or decoded keep their row with undefined
/// features; storage failures while writing results abort the batch.
pub fn run_batch(store: &dyn ObjectStore, config: &PipelineConfig) -> Result<BatchReport> {
    let _span = info_span!("batch", table = %config.table_key).entered();

    if store.ensure_bucket(&config.processed_bucket)? {
        info!(bucket = %config.processed_bucket, "processed bucket created");
    }

    let metadata = store.get(&config.source_bucket, &config.metadata_key)?;
    let mut samples = parse_metadata(&metadata)?;
    let mut by_diagnosis: BTreeMap<&'static str, usize> = BTreeMap::new();
    for sample in &samples {
        *by_diagnosis.entry(sample.diagnosis.display_name()).or_default() += 1;
    }
    for (cell_type, count) in &by_diagnosis {
        info!(cell_type, count, "metadata rows");
    }
    if let Some(mean) = impute_missing_age(&mut samples) {
        info!(mean_age = mean, "imputed missing ages");
    }
    if let Some(per_class) = config.samples_per_class {
        samples = balance(&samples, per_class, config.seed);
    }

    let pipeline = config.pipeline();
    info!(samples = samples.len(), "{}", pipeline.info());

    let source = ImageSource::new(store, config.source_bucket.clone(), config.images_dir.clone());
    let mut builder = FeatureTableBuilder::with_capacity(&pipeline, samples.len());
    for sample in &samples {
        match source.fetch(&sample.image_id) {
            Ok(image) => {
                let record = builder.push(&sample.image_id, sample.label(), &image);
                if !config.save_masks {
                    continue;
                }
                if let Some(mask) = record.segmented_image.as_ref().and_then(|p| p.to_image()) {
                    save_mask(
                        store,
                        &config.processed_bucket,
                        &config.segmented_dir,
                        &sample.image_id,
                        &mask,
                    )?;
                }
            }
            Err(err) => builder.push_unavailable(&sample.image_id, sample.label(), err.to_string()),
        }
    }

    let report = builder.finish();
    if !report.failures.is_empty() {
        warn!(failures = report.failures.len(), "some samples have undefined features");
    }

    save_table(
        store,
        &config.processed_bucket,
        &config.table_key,
        &report.table,
        config.table_format,
    )?;
    Ok(report)
}

/// Per-label overview of a previously persisted table
pub fn summarize(store: &dyn ObjectStore, config: &PipelineConfig) -> Result<TableSummary> {
    let table = load_table(store, &config.processed_bucket, &config.table_key, config.table_format)?;
    Ok(table.summary())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::StoreError, object_store::FsObjectStore};

    #[test]
    fn test_image_key_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        let source = ImageSource::new(&store, "raw", "data/images/");
        assert_eq!(source.key("ISIC_0024306"), "data/images/ISIC_0024306.jpg");
    }

    #[test]
    fn test_fetch_rejects_undecodable_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        store.put("raw", "images/broken.jpg", b"not a jpeg").unwrap();

        let source = ImageSource::new(&store, "raw", "images");
        assert!(matches!(source.fetch("broken"), Err(StoreError::Image(_))));
        assert!(matches!(source.fetch("missing"), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_non_utf8_metadata_aborts_batch() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        let config = PipelineConfig::default();
        store
            .put(&config.source_bucket, &config.metadata_key, b"image_id,dx\nISIC_\xff\xfe,nv\n")
            .unwrap();

        assert!(matches!(
            run_batch(&store, &config),
            Err(StoreError::Metadata { line: 2, .. })
        ));
    }

    #[test]
    fn test_missing_metadata_aborts_batch() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        let config = PipelineConfig::default();
        assert!(matches!(run_batch(&store, &config), Err(StoreError::NotFound { .. })));
    }
}
