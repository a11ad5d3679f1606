//! HAM10000 metadata: diagnosis codes, their binary labels, and the CSV
//! table that lists every image.

use std::str::FromStr;

use lesion::Label;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tracing::debug;
use crate::error::{Result, StoreError};

/// Diagnosis code as found in the `dx` column
#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq, Hash
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Diagnosis {
    Nv,
    Mel,
    Bkl,
    Bcc,
    Akiec,
    Vasc,
    Df,
}

impl Diagnosis {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Nv => "Melanocytic nevi",
            Self::Mel => "Melanoma",
            Self::Bkl => "Benign keratosis-like lesions",
            Self::Bcc => "Basal cell carcinoma",
            Self::Akiec => "Actinic keratoses",
            Self::Vasc => "Vascular lesions",
            Self::Df => "Dermatofibroma",
        }
    }

    /// Benign for nevi, keratoses, dermatofibroma and vascular lesions;
    /// malignant for melanoma, carcinoma and actinic keratoses.
    pub fn label(&self) -> Label {
        match self {
            Self::Bkl | Self::Df | Self::Nv | Self::Vasc => Label::Benign,
            Self::Akiec | Self::Mel | Self::Bcc => Label::Malignant,
        }
    }
}

/// One row of the metadata table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SampleMeta {
    pub lesion_id: Option<String>,
    pub image_id: String,
    pub diagnosis: Diagnosis,
    pub dx_type: Option<String>,
    pub age: Option<f64>,
    pub sex: Option<String>,
    pub localization: Option<String>,
}

impl SampleMeta {
    pub fn label(&self) -> Label {
        self.diagnosis.label()
    }
}

/// Raw CSV row, matched to the header by column name
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MetadataRow {
    lesion_id: Option<String>,
    image_id: Option<String>,
    dx: Option<String>,
    dx_type: Option<String>,
    age: Option<String>,
    sex: Option<String>,
    localization: Option<String>,
}

fn missing(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != "NA")
}

fn csv_error(err: csv::Error) -> StoreError {
    StoreError::Metadata {
        line: err.position().map_or(0, |pos| pos.line() as usize),
        reason: err.to_string(),
    }
}

impl MetadataRow {
    fn into_sample(self, line: usize) -> Result<SampleMeta> {
        let required = |value: Option<String>, name: &str| {
            missing(value).ok_or_else(|| StoreError::Metadata {
                line,
                reason: format!("missing {}", name),
            })
        };

        let image_id = required(self.image_id, "image_id")?;
        let dx = required(self.dx, "dx")?;
        let diagnosis = Diagnosis::from_str(&dx).map_err(|_| StoreError::UnknownDiagnosis(dx.clone()))?;
        let age = match missing(self.age) {
            Some(raw) => Some(raw.parse::<f64>().map_err(|e| StoreError::Metadata {
                line,
                reason: format!("invalid age '{}': {}", raw, e),
            })?),
            None => None,
        };

        Ok(SampleMeta {
            lesion_id: missing(self.lesion_id),
            image_id,
            diagnosis,
            dx_type: missing(self.dx_type),
            age,
            sex: missing(self.sex),
            localization: missing(self.localization),
        })
    }
}

/// Parse the metadata CSV. Columns are matched by header name; empty and
/// `NA` cells are treated as missing. Bytes must be valid UTF-8.
pub fn parse_metadata(data: &[u8]) -> Result<Vec<SampleMeta>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers().map_err(csv_error)?.clone();
    for column in ["image_id", "dx"] {
        if !headers.iter().any(|h| h == column) {
            return Err(StoreError::Metadata {
                line: 1,
                reason: format!("missing '{}' column", column),
            });
        }
    }

    let mut samples = Vec::new();
    let mut record = csv::StringRecord::new();
    while reader.read_record(&mut record).map_err(csv_error)? {
        let line = record.position().map_or(0, |pos| pos.line() as usize);
        let row: MetadataRow = record.deserialize(Some(&headers)).map_err(csv_error)?;
        samples.push(row.into_sample(line)?);
    }

    debug!(rows = samples.len(), "metadata parsed");
    Ok(samples)
}

/// Replace missing ages with the mean of the known ones; returns that mean.
pub fn impute_missing_age(samples: &mut [SampleMeta]) -> Option<f64> {
    let known: Vec<f64> = samples.iter().filter_map(|s| s.age).collect();
    if known.is_empty() {
        return None;
    }
    let mean = known.iter().sum::<f64>() / known.len() as f64;
    for sample in samples.iter_mut().filter(|s| s.age.is_none()) {
        sample.age = Some(mean);
    }
    Some(mean)
}
