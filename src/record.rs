// 📰 Disclosure Records - Raw input rows and their validated form
// One row per announcement, keyed by the issuing entity's stock code

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::EngineError;

/// KRX stock codes are six digits; shorter numeric ids lost their leading zeros
pub const ENTITY_CODE_WIDTH: usize = 6;

// ============================================================================
// ENTITY IDENTIFIER
// ============================================================================

/// Normalized entity identifier
///
/// "5930", " 005930 ", "5930.0" and 5930 (a number cell) all become "005930",
/// so a code read back from a spreadsheet never forks into a second summary row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    pub fn new(raw: &str) -> Self {
        EntityId(normalize_entity_id(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for EntityId {
    fn from(raw: String) -> Self {
        EntityId::new(&raw)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

fn normalize_entity_id(raw: &str) -> String {
    let trimmed = raw.trim();

    let digits = match trimmed.strip_suffix(".0") {
        Some(rest) if is_all_digits(rest) => rest,
        _ => trimmed,
    };

    if is_all_digits(digits) && digits.len() < ENTITY_CODE_WIDTH {
        format!("{:0>width$}", digits, width = ENTITY_CODE_WIDTH)
    } else {
        digits.to_string()
    }
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

// ============================================================================
// DATES
// ============================================================================

/// Parse a disclosure date (supports YYYY-MM-DD and DART's YYYYMMDD)
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    let s = date_str.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }

    if s.len() == 8 {
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y%m%d") {
            return Some(date);
        }
    }

    None
}

// ============================================================================
// RAW DISCLOSURE (as delivered by the fetch collaborator)
// ============================================================================

/// One announcement as it arrives: every field may be absent or mistyped
///
/// Field names follow the DART list API (`stock_code`, `corp_name`,
/// `report_nm`, `rcept_dt`, `rcept_no`); the neutral names are accepted too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDisclosure {
    #[serde(rename = "stock_code", alias = "entity_id", default, deserialize_with = "loose_string")]
    pub entity_id: Option<String>,

    #[serde(rename = "corp_name", alias = "entity_name", default)]
    pub entity_name: Option<String>,

    #[serde(rename = "report_nm", alias = "title", default)]
    pub title: Option<String>,

    #[serde(rename = "rcept_dt", alias = "date", default, deserialize_with = "loose_string")]
    pub date: Option<String>,

    #[serde(rename = "rcept_no", alias = "report_id", default, deserialize_with = "loose_string")]
    pub report_id: Option<String>,
}

impl RawDisclosure {
    pub fn new(entity_id: &str, entity_name: &str, title: &str, date: &str) -> Self {
        RawDisclosure {
            entity_id: Some(entity_id.to_string()),
            entity_name: Some(entity_name.to_string()),
            title: Some(title.to_string()),
            date: Some(date.to_string()),
            report_id: None,
        }
    }

    pub fn with_report_id(mut self, report_id: &str) -> Self {
        self.report_id = Some(report_id.to_string());
        self
    }

    /// Check required fields and build the immutable record
    ///
    /// `index` is the row's position in the batch and is carried into the error.
    pub fn validate(&self, index: usize) -> Result<DisclosureRecord, EngineError> {
        let entity_id = self
            .entity_id
            .as_deref()
            .map(EntityId::new)
            .filter(|id| !id.is_blank())
            .ok_or_else(|| EngineError::invalid(index, "entity_id", "is missing", None))?;

        let entity_name = non_blank(self.entity_name.as_deref()).ok_or_else(|| {
            EngineError::invalid(index, "entity_name", "is missing", Some(entity_id.as_str()))
        })?;

        let date_str = non_blank(self.date.as_deref()).ok_or_else(|| {
            EngineError::invalid(index, "date", "is missing", Some(entity_id.as_str()))
        })?;

        let date = parse_date(date_str).ok_or_else(|| {
            EngineError::invalid(
                index,
                "date",
                format!("'{}' is not YYYY-MM-DD or YYYYMMDD", date_str),
                Some(entity_id.as_str()),
            )
        })?;

        Ok(DisclosureRecord {
            entity_id,
            entity_name: entity_name.to_string(),
            title: self.title.clone().unwrap_or_default(),
            date,
            report_id: non_blank(self.report_id.as_deref()).map(str::to_string),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Accept strings or bare numbers (codes and dates often arrive number-typed)
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Str(String),
        Int(i64),
        UInt(u64),
        Float(f64),
    }

    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        Loose::Str(s) => s,
        Loose::Int(n) => n.to_string(),
        Loose::UInt(n) => n.to_string(),
        Loose::Float(n) => n.to_string(),
    }))
}

// ============================================================================
// DISCLOSURE RECORD (validated, immutable)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureRecord {
    pub entity_id: EntityId,
    pub entity_name: String,
    /// Free-text announcement title; empty when the source had none
    pub title: String,
    pub date: NaiveDate,
    /// Filing receipt number, used only as a dedup tie-break
    pub report_id: Option<String>,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_normalization() {
        assert_eq!(EntityId::new("5930").as_str(), "005930");
        assert_eq!(EntityId::new(" 005930 ").as_str(), "005930");
        assert_eq!(EntityId::new("5930.0").as_str(), "005930");
        assert_eq!(EntityId::new("373220").as_str(), "373220");
        assert_eq!(EntityId::new("K12345").as_str(), "K12345");
        assert!(EntityId::new("   ").is_blank());
    }

    #[test]
    fn test_entity_id_equality_across_forms() {
        assert_eq!(EntityId::new("5930"), EntityId::new("005930"));
        assert_eq!(EntityId::from("5930.0".to_string()), EntityId::new("005930"));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_date("2024-03-01"), Some(expected));
        assert_eq!(parse_date("20240301"), Some(expected));
        assert_eq!(parse_date("03/01/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_validate_complete_record() {
        let raw = RawDisclosure::new("5930", "Samsung", "공급계약 체결", "20240301")
            .with_report_id("20240301000123");

        let record = raw.validate(0).unwrap();
        assert_eq!(record.entity_id.as_str(), "005930");
        assert_eq!(record.entity_name, "Samsung");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(record.report_id.as_deref(), Some("20240301000123"));
    }

    #[test]
    fn test_validate_missing_title_becomes_empty() {
        let mut raw = RawDisclosure::new("005930", "Samsung", "", "2024-03-01");
        raw.title = None;

        let record = raw.validate(0).unwrap();
        assert_eq!(record.title, "");
    }

    #[test]
    fn test_validate_reports_missing_fields() {
        let mut raw = RawDisclosure::new("005930", "Samsung", "x", "2024-03-01");
        raw.entity_id = Some("  ".to_string());
        match raw.validate(7) {
            Err(EngineError::InvalidRecord { index, field, .. }) => {
                assert_eq!(index, 7);
                assert_eq!(field, "entity_id");
            }
            other => panic!("expected InvalidRecord, got {:?}", other),
        }

        let mut raw = RawDisclosure::new("005930", "Samsung", "x", "2024-03-01");
        raw.entity_name = None;
        match raw.validate(1) {
            Err(EngineError::InvalidRecord { field, entity, .. }) => {
                assert_eq!(field, "entity_name");
                assert_eq!(entity.as_deref(), Some("005930"));
            }
            other => panic!("expected InvalidRecord, got {:?}", other),
        }

        let raw = RawDisclosure::new("005930", "Samsung", "x", "yesterday");
        assert!(matches!(
            raw.validate(2),
            Err(EngineError::InvalidRecord { field: "date", .. })
        ));
    }

    #[test]
    fn test_raw_disclosure_accepts_numeric_codes() {
        let json = r#"{"stock_code": 5930, "corp_name": "삼성전자", "report_nm": "임상 승인", "rcept_dt": 20240301}"#;
        let raw: RawDisclosure = serde_json::from_str(json).unwrap();

        assert_eq!(raw.entity_id.as_deref(), Some("5930"));
        assert_eq!(raw.date.as_deref(), Some("20240301"));
        assert_eq!(raw.validate(0).unwrap().entity_id.as_str(), "005930");
    }

    #[test]
    fn test_raw_disclosure_accepts_neutral_names() {
        let json = r#"{"entity_id": "000660", "entity_name": "SK hynix", "title": "MOU", "date": "2024-03-02"}"#;
        let raw: RawDisclosure = serde_json::from_str(json).unwrap();

        assert_eq!(raw.entity_id.as_deref(), Some("000660"));
        assert_eq!(raw.title.as_deref(), Some("MOU"));
        assert!(raw.report_id.is_none());
    }
}
