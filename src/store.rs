//! CSV persistence for the URL manifest and the extracted records.

use crate::amazon::ProductRecord;
use crate::error::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Manifest column name. Readers also accept `Product URL` and `ProductURL`.
pub const MANIFEST_COLUMN: &str = "Product_URL";

const MANIFEST_ALIASES: [&str; 3] = [MANIFEST_COLUMN, "Product URL", "ProductURL"];

#[derive(Debug, Serialize, Deserialize)]
struct ManifestRow {
    #[serde(rename = "Product_URL", alias = "Product URL", alias = "ProductURL")]
    url: String,
}

#[derive(Debug, Serialize)]
struct DetailRow<'a> {
    #[serde(rename = "Product_URL")]
    url: &'a str,
    #[serde(rename = "Title")]
    title: String,
    price: String,
    #[serde(rename = "Reviews")]
    reviews: String,
}

impl<'a> From<&'a ProductRecord> for DetailRow<'a> {
    fn from(record: &'a ProductRecord) -> Self {
        Self {
            url: &record.url,
            title: record.title.cell(),
            price: record.price.cell(),
            reviews: record.reviews.cell(),
        }
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| ScrapeError::persistence(path, e))
        }
        _ => Ok(()),
    }
}

/// Writes the manifest, one URL per row, in the given order.
pub fn write_manifest(path: &Path, urls: &[String]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path).map_err(|e| ScrapeError::persistence(path, e))?;

    if urls.is_empty() {
        writer
            .write_record([MANIFEST_COLUMN])
            .map_err(|e| ScrapeError::persistence(path, e))?;
    }
    for url in urls {
        writer
            .serialize(ManifestRow { url: url.clone() })
            .map_err(|e| ScrapeError::persistence(path, e))?;
    }
    writer.flush().map_err(|e| ScrapeError::persistence(path, e))?;

    info!("Wrote {} URLs to {}", urls.len(), path.display());
    Ok(())
}

/// Reads the manifest back in file order.
pub fn read_manifest(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(ScrapeError::ManifestNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|e| ScrapeError::persistence(path, e))?;

    let headers = reader.headers().map_err(|e| ScrapeError::persistence(path, e))?;
    if !headers.iter().any(|h| MANIFEST_ALIASES.contains(&h)) {
        return Err(ScrapeError::persistence(
            path,
            format!("missing required '{}' column", MANIFEST_COLUMN),
        ));
    }

    let mut urls = Vec::new();
    for row in reader.deserialize::<ManifestRow>() {
        let row = row.map_err(|e| ScrapeError::persistence(path, e))?;
        let url = row.url.trim();
        if !url.is_empty() {
            urls.push(url.to_string());
        }
    }

    debug!("Read {} URLs from {}", urls.len(), path.display());
    Ok(urls)
}

/// Writes all records in one batch. Unavailable fields are written as `N/A`.
///
/// Columns are `Product_URL, Title, price, Reviews`. The leading URL column
/// joins each row back to its manifest entry.
pub fn write_records(path: &Path, records: &[ProductRecord]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path).map_err(|e| ScrapeError::persistence(path, e))?;

    if records.is_empty() {
        writer
            .write_record([MANIFEST_COLUMN, "Title", "price", "Reviews"])
            .map_err(|e| ScrapeError::persistence(path, e))?;
    }
    for record in records {
        writer
            .serialize(DetailRow::from(record))
            .map_err(|e| ScrapeError::persistence(path, e))?;
    }
    writer.flush().map_err(|e| ScrapeError::persistence(path, e))?;

    info!("Product details saved to {}", path.display());
    Ok(())
}
