//! # Lesion Feature Extraction Library
//!
//! Segments skin lesions out of dermoscopy frames and measures them: the
//! binary mask, its outer contours, shape features (perimeter, pixel area,
//! circularity, principal-axis asymmetry) and the cropped colour planes,
//! gathered into one typed record per image.
//!
//! ## Core Features
//!
//! - **Trait-based Architecture**: every stage sits behind a trait
//!   (`Segmenter`, `ContourExtractor`, `FeatureEngine`, `ChannelSplitter`)
//! - **Pipeline System**: stages are composed with a fluent builder
//! - **Typed Undefined Values**: features that cannot be computed are `None`,
//!   never NaN or infinity
//! - **Batch Tables**: a failed image keeps its row, with only the affected
//!   fields left undefined
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lesion::{Label, Pipeline};
//!
//! let pipeline = Pipeline::builder().build();
//!
//! let image = image::open("ISIC_0024306.jpg")?.to_rgb8();
//! let (record, failures) = pipeline.process("ISIC_0024306", Label::Benign, &image);
//!
//! println!("circularity: {:?}", record.circularity);
//! assert!(failures.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Batches
//!
//! ```rust,no_run
//! use lesion::{FeatureTableBuilder, Label, Pipeline};
//!
//! let pipeline = Pipeline::default();
//! let mut builder = FeatureTableBuilder::new(&pipeline);
//! for id in ["ISIC_0027419", "ISIC_0025030"] {
//!     match image::open(format!("{id}.jpg")) {
//!         Ok(image) => { builder.push(id, Label::Benign, &image.to_rgb8()); }
//!         Err(err) => builder.push_unavailable(id, Label::Benign, err.to_string()),
//!     }
//! }
//! let report = builder.finish();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod record;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod table;

// Re-exports for convenience
pub use error::{LesionError, Result};
pub use types::{Contour, CropWindow, Moments};
pub use record::{ChannelPlanes, FeatureRecord, GeometricFeatures, Label, Plane};
pub use traits::*;
pub use algorithms::*;
pub use pipeline::{Pipeline, SampleFailure, Stage, builder::PipelineBuilder};
pub use table::{BatchReport, FeatureTable, FeatureTableBuilder, TableSummary};
