// 🏷️ Sector Classifier - First-match-wins keyword sets
// Order of the map is the tie-break when a title hits several sectors

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Rendered label for titles no sector claims
pub const UNCLASSIFIED_LABEL: &str = "기타";

// ============================================================================
// SECTOR LABEL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SectorLabel {
    Named(String),
    Unclassified,
}

impl SectorLabel {
    pub fn named(label: &str) -> Self {
        SectorLabel::from(label.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            SectorLabel::Named(label) => label,
            SectorLabel::Unclassified => UNCLASSIFIED_LABEL,
        }
    }

    pub fn is_unclassified(&self) -> bool {
        matches!(self, SectorLabel::Unclassified)
    }
}

impl From<String> for SectorLabel {
    fn from(label: String) -> Self {
        let trimmed = label.trim();
        if trimmed.is_empty() || trimmed == UNCLASSIFIED_LABEL {
            SectorLabel::Unclassified
        } else {
            SectorLabel::Named(trimmed.to_string())
        }
    }
}

impl From<SectorLabel> for String {
    fn from(label: SectorLabel) -> Self {
        label.as_str().to_string()
    }
}

impl fmt::Display for SectorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// SECTOR MAP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorRule {
    /// Stored trimmed, the same form `SectorLabel` carries
    #[serde(deserialize_with = "trimmed")]
    pub label: String,
    pub keywords: Vec<String>,
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().to_string())
}

impl SectorRule {
    pub fn matches(&self, title: &str) -> bool {
        self.keywords
            .iter()
            .any(|kw| !kw.is_empty() && title.contains(kw.as_str()))
    }
}

/// Ordered sector → keywords mapping
///
/// Holds no state between calls; the industry and theme classifications are
/// just two different maps run over the same title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorMap(Vec<SectorRule>);

impl SectorMap {
    pub fn new(entries: &[(&str, &[&str])]) -> Self {
        SectorMap(
            entries
                .iter()
                .map(|(label, keywords)| SectorRule {
                    label: label.trim().to_string(),
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                })
                .collect(),
        )
    }

    /// First sector (in map order) with any keyword contained in `title`
    pub fn classify(&self, title: &str) -> SectorLabel {
        self.0
            .iter()
            .find(|rule| rule.matches(title))
            .map(|rule| SectorLabel::named(&rule.label))
            .unwrap_or(SectorLabel::Unclassified)
    }

    pub fn rules(&self) -> &[SectorRule] {
        &self.0
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|rule| rule.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// HTS-style industry buckets
    pub fn default_industry() -> Self {
        SectorMap::new(&[
            ("기계", &["기계", "로봇", "장비"]),
            ("전기전자", &["전력", "AI", "반도체"]),
            ("화학", &["신약", "바이오", "소재"]),
            ("운수장비", &["우주", "항공", "발사체"]),
            ("건설", &["인프라", "플랜트"]),
        ])
    }

    /// Investment themes; the first two are the priority themes
    pub fn default_theme() -> Self {
        SectorMap::new(&[
            ("AI 전력 인프라", &["AI전력", "데이터센터전력", "전력"]),
            ("우주·발사체", &["우주", "위성", "발사체"]),
            ("양자", &["양자", "양자보안"]),
            ("차세대 신약", &["신약", "플랫폼"]),
        ])
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_title_is_unclassified() {
        let themes = SectorMap::default_theme();
        assert_eq!(themes.classify(""), SectorLabel::Unclassified);
        assert_eq!(themes.classify("신규사업 공급계약 체결"), SectorLabel::Unclassified);
    }

    #[test]
    fn test_first_sector_in_order_wins() {
        // Hits both the priority "AI 전력 인프라" theme and "차세대 신약"
        let title = "전력 설비 및 신약 플랫폼 공급계약";
        let themes = SectorMap::default_theme();
        assert_eq!(themes.classify(title), SectorLabel::named("AI 전력 인프라"));

        let reversed = SectorMap::new(&[
            ("차세대 신약", &["신약", "플랫폼"]),
            ("AI 전력 인프라", &["AI전력", "데이터센터전력", "전력"]),
        ]);
        assert_eq!(reversed.classify(title), SectorLabel::named("차세대 신약"));
    }

    #[test]
    fn test_independent_maps_over_same_title() {
        let title = "위성 발사체 공급계약";
        assert_eq!(
            SectorMap::default_industry().classify(title),
            SectorLabel::named("운수장비")
        );
        assert_eq!(
            SectorMap::default_theme().classify(title),
            SectorLabel::named("우주·발사체")
        );
    }

    #[test]
    fn test_industry_map_is_case_sensitive() {
        let industry = SectorMap::default_industry();
        assert_eq!(industry.classify("AI 반도체"), SectorLabel::named("전기전자"));
        assert_eq!(industry.classify("ai 솔루션"), SectorLabel::Unclassified);
    }

    #[test]
    fn test_rule_labels_are_trimmed_on_load() {
        let json = r#"[{"label": " 양자 ", "keywords": ["양자"]}]"#;
        let map: SectorMap = serde_json::from_str(json).unwrap();

        assert_eq!(map.rules()[0].label, "양자");
        assert_eq!(map.labels().collect::<Vec<_>>(), vec!["양자"]);
        assert_eq!(map.classify("양자 암호"), SectorLabel::named("양자"));
    }

    #[test]
    fn test_label_round_trips_through_string() {
        assert_eq!(SectorLabel::from("기타".to_string()), SectorLabel::Unclassified);
        assert_eq!(SectorLabel::from(String::new()), SectorLabel::Unclassified);
        assert_eq!(String::from(SectorLabel::Unclassified), "기타");
        assert_eq!(SectorLabel::named("양자").as_str(), "양자");
    }
}
