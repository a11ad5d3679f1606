//! # Lesion Store
//!
//! Dataset and storage glue around the `lesion` pipeline: a blob store
//! abstraction with a filesystem backend, the HAM10000 metadata table,
//! balanced resampling, batch processing and table/mask persistence.
//!
//! ```rust,no_run
//! use lesion_store::{FsObjectStore, PipelineConfig, run_batch};
//!
//! let config = PipelineConfig::from_file("batch.toml")?;
//! let store = FsObjectStore::new(&config.store_root);
//! let report = run_batch(&store, &config)?;
//! println!("{} rows, {} failures", report.table.len(), report.failures.len());
//! # Ok::<(), lesion_store::StoreError>(())
//! ```

pub mod error;
pub mod object_store;
pub mod metadata;
pub mod sampling;
pub mod config;
pub mod persist;
pub mod batch;

pub use error::{Result, StoreError};
pub use object_store::{FsObjectStore, ObjectStore};
pub use metadata::{Diagnosis, SampleMeta, impute_missing_age, parse_metadata};
pub use sampling::balance;
pub use config::{PipelineConfig, SegmentationConfig, TableFormat};
pub use persist::{decode_table, encode_table, load_table, mask_key, save_mask, save_table};
pub use batch::{ImageSource, run_batch, summarize};
