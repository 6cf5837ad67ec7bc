//! JSON and CSV exporters for extracted records.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use clap::ValueEnum;
use shopgrab_core::{ProductRecord, Region, SiteKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ExportFormat {
    Json,
    Csv,
    Both,
}

/// `{site}_{region}_products_{YYYYmmdd_HHMMSS}`
pub(crate) fn default_stem(site: SiteKind, region: Region, at: NaiveDateTime) -> String {
    format!(
        "{site}_{}_products_{}",
        region.code(),
        at.format("%Y%m%d_%H%M%S")
    )
}

fn with_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut path = stem.as_os_str().to_owned();
    path.push(".");
    path.push(ext);
    PathBuf::from(path)
}

/// Writes `records` in `format` next to `stem`, returning the paths written.
///
/// # Errors
///
/// Returns an error if a file cannot be created or serialization fails.
pub(crate) fn write_records(
    records: &[ProductRecord],
    stem: &Path,
    format: ExportFormat,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if matches!(format, ExportFormat::Json | ExportFormat::Both) {
        let path = with_extension(stem, "json");
        write_json(records, &path)?;
        written.push(path);
    }
    if matches!(format, ExportFormat::Csv | ExportFormat::Both) {
        let path = with_extension(stem, "csv");
        write_csv(records, &path)?;
        written.push(path);
    }
    Ok(written)
}

/// Pretty-printed JSON array; every record key is kept as serialized.
pub(crate) fn write_json(records: &[ProductRecord], path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Flat CSV: one row per record, columns are the union of every row's
/// columns in first-seen order, absent cells left empty.
pub(crate) fn write_csv(records: &[ProductRecord], path: &Path) -> anyhow::Result<()> {
    let rows: Vec<Vec<(String, String)>> = records.iter().map(flatten).collect();

    let mut columns: Vec<&str> = Vec::new();
    for (key, _) in rows.iter().flatten() {
        if !columns.contains(&key.as_str()) {
            columns.push(key.as_str());
        }
    }

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", path.display()))?;
    writer.write_record(&columns)?;
    for row in &rows {
        writer.write_record(columns.iter().map(|column| {
            row.iter()
                .find(|(key, _)| key == column)
                .map_or("", |(_, value)| value.as_str())
        }))?;
    }
    writer.flush()?;
    Ok(())
}

/// Lowercase, with every run of non-alphanumerics collapsed to `_`.
pub(crate) fn snake_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_owned()
}

fn joined(items: &[String]) -> Option<String> {
    (!items.is_empty()).then(|| items.join("|"))
}

fn flatten(record: &ProductRecord) -> Vec<(String, String)> {
    let mut row: Vec<(String, String)> = Vec::new();
    let mut put = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            row.push((key.to_owned(), value));
        }
    };

    put("product_id", Some(record.product_id.clone()));
    put("source_site", Some(record.source_site.to_string()));
    put("url", record.url.clone());
    put("region", record.region.clone());
    put("name", record.name.clone());
    put("brand", record.brand.clone());
    put("selling_price", record.selling_price.map(|v| v.to_string()));
    put("mrp", record.mrp.map(|v| v.to_string()));
    put("discount_percent", record.discount_percent.map(|v| v.to_string()));
    put("average_rating", record.average_rating.map(|v| v.to_string()));
    put("rating_count", record.rating_count.map(|v| v.to_string()));
    put("availability", record.availability.clone());
    put("in_stock", record.in_stock.map(|v| v.to_string()));
    put("description", record.description.clone());
    put("image_url", record.primary_image().map(str::to_owned));
    put("all_images", joined(&record.images));
    put("features", joined(&record.features));
    put("categories", joined(&record.categories));
    let sizes = record.available_sizes();
    put("available_sizes", (!sizes.is_empty()).then(|| sizes.join("|")));
    if record.is_fallback {
        put("is_fallback", Some("true".to_string()));
    }
    for (key, value) in &record.specifications {
        let column = unique_column(&row, &format!("spec_{}", snake_key(key)));
        row.push((column, value.clone()));
    }
    row
}

/// `base`, or `base_2`, `base_3`, ... when distinct keys normalize alike.
fn unique_column(row: &[(String, String)], base: &str) -> String {
    let taken = |name: &str| row.iter().any(|(key, _)| key == name);
    if !taken(base) {
        return base.to_owned();
    }
    (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|name| !taken(name))
        .unwrap_or_else(|| base.to_owned())
}
