use std::io::Cursor;

use image::{GrayImage, ImageFormat};
use lesion::FeatureTable;
use tracing::info;
use crate::{config::TableFormat, error::Result, object_store::ObjectStore};

pub fn encode_table(table: &FeatureTable, format: TableFormat) -> Result<Vec<u8>> {
    match format {
        TableFormat::Json => Ok(serde_json::to_vec(table)?),
        TableFormat::Bincode => Ok(bincode::serde::encode_to_vec(table, bincode::config::standard())?),
    }
}

pub fn decode_table(bytes: &[u8], format: TableFormat) -> Result<FeatureTable> {
    match format {
        TableFormat::Json => Ok(serde_json::from_slice(bytes)?),
        TableFormat::Bincode => {
            let (table, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
            Ok(table)
        }
    }
}

/// Write the table under `bucket/key`
pub fn save_table(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    table: &FeatureTable,
    format: TableFormat,
) -> Result<()> {
    let bytes = encode_table(table, format)?;
    store.put(bucket, key, &bytes)?;
    info!(bucket, key, rows = table.len(), %format, size = bytes.len(), "feature table saved");
    Ok(())
}

pub fn load_table(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    format: TableFormat,
) -> Result<FeatureTable> {
    let bytes = store.get(bucket, key)?;
    decode_table(&bytes, format)
}

/// Object key of the mask image for `image_id`
pub fn mask_key(dir: &str, image_id: &str) -> String {
    format!("{}/{}.png", dir.trim_end_matches('/'), image_id)
}

/// Store a mask as PNG and return its key
pub fn save_mask(
    store: &dyn ObjectStore,
    bucket: &str,
    dir: &str,
    image_id: &str,
    mask: &GrayImage,
) -> Result<String> {
    let mut bytes = Vec::new();
    mask.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    let key = mask_key(dir, image_id);
    store.put(bucket, &key, &bytes)?;
    Ok(key)
}
