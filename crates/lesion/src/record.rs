use image::{GrayImage, ImageBuffer};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Ground-truth class of a lesion, serialized as `0` / `1`.
#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize,
    Display, EnumString, EnumIter, IntoStaticStr,
    PartialEq, Eq, Hash, PartialOrd, Ord
)]
#[serde(into = "u8", try_from = "u8")]
#[strum(serialize_all = "snake_case")]
pub enum Label {
    Benign,
    Malignant,
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        match label {
            Label::Benign => 0,
            Label::Malignant => 1,
        }
    }
}

impl TryFrom<u8> for Label {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Label::Benign),
            1 => Ok(Label::Malignant),
            other => Err(format!("invalid label {other}, expected 0 or 1")),
        }
    }
}

/// A single-channel 8-bit plane stored row-major, as persisted in the
/// feature table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plane {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Plane {
    /// Rebuild the image; `None` if `data` does not match the dimensions
    pub fn to_image(&self) -> Option<GrayImage> {
        ImageBuffer::from_raw(self.width, self.height, self.data.clone())
    }

    pub fn count_non_zero(&self) -> u64 {
        self.data.iter().filter(|&&v| v != 0).count() as u64
    }
}

impl From<GrayImage> for Plane {
    fn from(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }
}

impl From<&GrayImage> for Plane {
    fn from(image: &GrayImage) -> Self {
        Self::from(image.clone())
    }
}

/// Shape measurements of one mask.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeometricFeatures {
    pub perimeter: f64,
    pub non_zeros: u64,
    pub circularity: Option<f64>,
    pub main_assymetry: Option<f64>,
    pub secondary_assymetry: Option<f64>,
}

/// Cropped colour planes in fixed R, G, B order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPlanes {
    pub red: GrayImage,
    pub green: GrayImage,
    pub blue: GrayImage,
}

/// One row of the feature table.
///
/// Every field after `image_id` is optional so that a sample whose
/// segmentation failed keeps its row; `None` marks an undefined value and
/// serializes as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureRecord {
    pub image_id: String,
    pub segmented_image: Option<Plane>,
    pub perimeter: Option<f64>,
    pub non_zeros: Option<u64>,
    pub circularity: Option<f64>,
    pub main_assymetry: Option<f64>,
    pub secondary_assymetry: Option<f64>,
    pub r_channel: Option<Plane>,
    pub g_channel: Option<Plane>,
    pub b_channel: Option<Plane>,
    pub label: Label,
}

impl FeatureRecord {
    /// A row with every derived field undefined
    pub fn undefined(image_id: impl Into<String>, label: Label) -> Self {
        Self {
            image_id: image_id.into(),
            segmented_image: None,
            perimeter: None,
            non_zeros: None,
            circularity: None,
            main_assymetry: None,
            secondary_assymetry: None,
            r_channel: None,
            g_channel: None,
            b_channel: None,
            label,
        }
    }

    pub fn with_geometry(mut self, mask: GrayImage, features: GeometricFeatures) -> Self {
        self.segmented_image = Some(mask.into());
        self.perimeter = Some(features.perimeter);
        self.non_zeros = Some(features.non_zeros);
        self.circularity = features.circularity;
        self.main_assymetry = features.main_assymetry;
        self.secondary_assymetry = features.secondary_assymetry;
        self
    }

    pub fn with_channels(mut self, channels: ChannelPlanes) -> Self {
        self.r_channel = Some(channels.red.into());
        self.g_channel = Some(channels.green.into());
        self.b_channel = Some(channels.blue.into());
        self
    }

    /// True when every scalar feature is defined
    pub fn is_complete(&self) -> bool {
        self.segmented_image.is_some()
            && self.perimeter.is_some()
            && self.non_zeros.is_some()
            && self.circularity.is_some()
            && self.main_assymetry.is_some()
            && self.secondary_assymetry.is_some()
            && self.r_channel.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_label_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Label::Benign).unwrap(), "0");
        assert_eq!(serde_json::to_string(&Label::Malignant).unwrap(), "1");
        let parsed: Label = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, Label::Malignant);
        assert!(serde_json::from_str::<Label>("2").is_err());
    }

    #[test]
    fn test_plane_round_trip() {
        let mut image = GrayImage::new(3, 2);
        image.put_pixel(2, 1, Luma([255]));
        let plane = Plane::from(&image);
        assert_eq!(plane.count_non_zero(), 1);
        assert_eq!(plane.to_image(), Some(image));

        let broken = Plane { width: 4, height: 4, data: vec![0; 3] };
        assert!(broken.to_image().is_none());
    }

    #[test]
    fn test_undefined_record_serializes_nulls() {
        let record = FeatureRecord::undefined("ISIC_0000001", Label::Benign);
        assert!(!record.is_complete());
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["circularity"].is_null());
        assert!(json["segmented_image"].is_null());
        assert_eq!(json["label"], 0);
    }
}
