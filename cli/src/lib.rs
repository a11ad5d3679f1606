use lesion::{FeatureRecord, Label, Plane};
use serde::{Deserialize, Serialize};

/// Scalar view of a feature record, without the pixel planes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordSummary {
    pub image_id: String,
    pub label: Label,
    pub perimeter: Option<f64>,
    pub non_zeros: Option<u64>,
    pub circularity: Option<f64>,
    pub main_assymetry: Option<f64>,
    pub secondary_assymetry: Option<f64>,
    /// `(width, height)` of the segmented mask
    pub mask_size: Option<(u32, u32)>,
    /// `(width, height)` shared by the colour planes
    pub channel_size: Option<(u32, u32)>,
}

fn size(plane: &Option<Plane>) -> Option<(u32, u32)> {
    plane.as_ref().map(|p| (p.width, p.height))
}

impl From<&FeatureRecord> for RecordSummary {
    fn from(record: &FeatureRecord) -> Self {
        Self {
            image_id: record.image_id.clone(),
            label: record.label,
            perimeter: record.perimeter,
            non_zeros: record.non_zeros,
            circularity: record.circularity,
            main_assymetry: record.main_assymetry,
            secondary_assymetry: record.secondary_assymetry,
            mask_size: size(&record.segmented_image),
            channel_size: size(&record.r_channel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_drops_planes() {
        let mut record = FeatureRecord::undefined("ISIC_0000001", Label::Malignant);
        record.segmented_image = Some(image::GrayImage::new(500, 340).into());
        record.perimeter = Some(123.5);

        let summary = RecordSummary::from(&record);
        assert_eq!(summary.mask_size, Some((500, 340)));
        assert_eq!(summary.channel_size, None);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["label"], 1);
        assert_eq!(json["perimeter"], 123.5);
        assert!(json["circularity"].is_null());
    }
}
