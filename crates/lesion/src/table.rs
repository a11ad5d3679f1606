use std::collections::BTreeMap;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use crate::{
    pipeline::{Pipeline, SampleFailure, Stage},
    record::{FeatureRecord, Label},
};

/// The enriched dataset handed to training, one record per source image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureTable {
    pub records: Vec<FeatureRecord>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, image_id: &str) -> Option<&FeatureRecord> {
        self.records.iter().find(|r| r.image_id == image_id)
    }

    /// Stable sort by `image_id`, for tables assembled out of order
    pub fn sort_by_image_id(&mut self) {
        self.records.sort_by(|a, b| a.image_id.cmp(&b.image_id));
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary::from_records(&self.records)
    }
}

/// Table plus the per-sample failures met while building it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub table: FeatureTable,
    pub failures: Vec<SampleFailure>,
}

/// Accumulates records in input order.
pub struct FeatureTableBuilder<'a> {
    pipeline: &'a Pipeline,
    records: Vec<FeatureRecord>,
    failures: Vec<SampleFailure>,
}

impl<'a> FeatureTableBuilder<'a> {
    pub fn new(pipeline: &'a Pipeline) -> Self {
        Self {
            pipeline,
            records: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn with_capacity(pipeline: &'a Pipeline, capacity: usize) -> Self {
        Self {
            pipeline,
            records: Vec::with_capacity(capacity),
            failures: Vec::new(),
        }
    }

    /// Process one image and append its record
    pub fn push(&mut self, image_id: &str, label: Label, image: &RgbImage) -> &FeatureRecord {
        let (record, failures) = self.pipeline.process(image_id, label, image);
        self.failures.extend(failures);
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// Append a row for an image that could not be obtained at all
    pub fn push_unavailable(&mut self, image_id: &str, label: Label, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(image_id, %reason, "image unavailable, row left undefined");
        self.failures.push(SampleFailure {
            image_id: image_id.to_string(),
            stage: Stage::Fetch,
            reason,
        });
        self.records.push(FeatureRecord::undefined(image_id, label));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn finish(self) -> BatchReport {
        let complete = self.records.iter().filter(|r| r.is_complete()).count();
        info!(
            rows = self.records.len(),
            complete,
            failures = self.failures.len(),
            "feature table built"
        );
        BatchReport {
            table: FeatureTable { records: self.records },
            failures: self.failures,
        }
    }
}

/// Running mean over defined values only
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MeanStat {
    pub count: usize,
    pub mean: Option<f64>,
}

impl MeanStat {
    fn from_values(values: impl Iterator<Item = f64>) -> Self {
        let (count, sum) = values.fold((0usize, 0.0f64), |(n, s), v| (n + 1, s + v));
        Self {
            count,
            mean: (count > 0).then(|| sum / count as f64),
        }
    }
}

/// Per-label overview of a feature table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LabelSummary {
    pub rows: usize,
    pub complete: usize,
    pub perimeter: MeanStat,
    pub non_zeros: MeanStat,
    pub circularity: MeanStat,
    pub main_assymetry: MeanStat,
    pub secondary_assymetry: MeanStat,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TableSummary {
    pub by_label: BTreeMap<String, LabelSummary>,
}

impl TableSummary {
    pub fn from_records(records: &[FeatureRecord]) -> Self {
        let mut grouped: BTreeMap<Label, Vec<&FeatureRecord>> = BTreeMap::new();
        for record in records {
            grouped.entry(record.label).or_default().push(record);
        }

        let by_label = grouped
            .into_iter()
            .map(|(label, rows)| {
                let summary = LabelSummary {
                    rows: rows.len(),
                    complete: rows.iter().filter(|r| r.is_complete()).count(),
                    perimeter: MeanStat::from_values(rows.iter().filter_map(|r| r.perimeter)),
                    non_zeros: MeanStat::from_values(
                        rows.iter().filter_map(|r| r.non_zeros.map(|n| n as f64)),
                    ),
                    circularity: MeanStat::from_values(rows.iter().filter_map(|r| r.circularity)),
                    main_assymetry: MeanStat::from_values(
                        rows.iter().filter_map(|r| r.main_assymetry),
                    ),
                    secondary_assymetry: MeanStat::from_values(
                        rows.iter().filter_map(|r| r.secondary_assymetry),
                    ),
                };
                (label.to_string(), summary)
            })
            .collect();

        Self { by_label }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::draw_filled_circle_mut;

    fn frame(radius: i32) -> RgbImage {
        let mut image = RgbImage::from_pixel(600, 450, Rgb([200, 160, 140]));
        draw_filled_circle_mut(&mut image, (300, 230), radius, Rgb([60, 40, 30]));
        image
    }

    #[test]
    fn test_rows_keep_input_order_and_failures() {
        let pipeline = Pipeline::default();
        let mut builder = FeatureTableBuilder::new(&pipeline);
        builder.push("c", Label::Malignant, &frame(50));
        builder.push_unavailable("a", Label::Benign, "object not found");
        builder.push("b", Label::Benign, &RgbImage::new(10, 10));
        assert_eq!(builder.len(), 3);

        let report = builder.finish();
        let ids: Vec<&str> = report.table.records.iter().map(|r| r.image_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);

        assert!(report.table.get("c").unwrap().is_complete());
        assert_eq!(report.table.get("a").unwrap().perimeter, None);
        assert_eq!(report.table.get("b").unwrap().label, Label::Benign);

        let stages: Vec<Stage> = report.failures.iter().map(|f| f.stage).collect();
        assert_eq!(stages, vec![Stage::Fetch, Stage::Segmentation, Stage::Channels]);
    }

    #[test]
    fn test_sort_by_image_id() {
        let mut table = FeatureTable {
            records: vec![
                FeatureRecord::undefined("b", Label::Benign),
                FeatureRecord::undefined("a", Label::Malignant),
            ],
        };
        table.sort_by_image_id();
        assert_eq!(table.records[0].image_id, "a");
    }

    #[test]
    fn test_summary_skips_undefined_values() {
        let pipeline = Pipeline::default();
        let mut builder = FeatureTableBuilder::new(&pipeline);
        builder.push("m1", Label::Malignant, &frame(40));
        builder.push("m2", Label::Malignant, &frame(60));
        builder.push_unavailable("m3", Label::Malignant, "missing");
        builder.push_unavailable("b1", Label::Benign, "missing");
        let table = builder.finish().table;

        let summary = table.summary();
        let malignant = &summary.by_label["malignant"];
        assert_eq!(malignant.rows, 3);
        assert_eq!(malignant.complete, 2);
        assert_eq!(malignant.circularity.count, 2);
        assert!(malignant.circularity.mean.unwrap() > 0.8);

        let benign = &summary.by_label["benign"];
        assert_eq!(benign.rows, 1);
        assert_eq!(benign.perimeter, MeanStat { count: 0, mean: None });
    }
}
