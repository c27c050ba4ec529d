// 📂 Batch Source - Read a day's disclosures handed over by the fetch job
// CSV with DART column names, or JSON (bare array or the DART list response)

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::record::RawDisclosure;

/// DART `list.json` response envelope
#[derive(Debug, Deserialize)]
struct DartListResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    list: Vec<RawDisclosure>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonBatch {
    Records(Vec<RawDisclosure>),
    Dart(DartListResponse),
}

/// Load a batch file, picking the format from the extension
pub fn load_disclosures(path: &Path) -> Result<Vec<RawDisclosure>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv") => load_disclosures_csv(path),
        Some("json") => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read batch file: {:?}", path))?;
            parse_disclosures_json(&content)
                .with_context(|| format!("Failed to parse batch file: {:?}", path))
        }
        _ => bail!("Unsupported batch file (expected .csv or .json): {:?}", path),
    }
}

pub fn load_disclosures_csv(path: &Path) -> Result<Vec<RawDisclosure>> {
    let mut rdr = csv::Reader::from_path(path).context("Failed to open CSV file")?;

    let mut records = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let record: RawDisclosure =
            result.with_context(|| format!("Failed to deserialize CSV row {}", line + 1))?;
        records.push(record);
    }

    Ok(records)
}

pub fn parse_disclosures_json(content: &str) -> Result<Vec<RawDisclosure>> {
    let batch: JsonBatch = serde_json::from_str(content).context("Failed to parse batch JSON")?;

    match batch {
        JsonBatch::Records(records) => Ok(records),
        JsonBatch::Dart(response) if response.status == "000" => Ok(response.list),
        JsonBatch::Dart(response) => bail!(
            "DART responded with status {}: {}",
            response.status,
            response.message.unwrap_or_default()
        ),
    }
}
