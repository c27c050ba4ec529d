// 📜 Scoring Rules - Rules as Data
// Keyword weights, sector maps and ranking policy, passed explicitly to every call

use anyhow::{bail, Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::classifier::SectorMap;
use crate::ranker::RankPolicy;
use crate::scorer::KeywordWeights;

// ============================================================================
// RULE SET
// ============================================================================

/// One immutable rule set
///
/// Every field falls back to the built-in table, so a rules file only needs
/// the parts it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRules {
    #[serde(default)]
    pub disclosure_weights: KeywordWeights,

    #[serde(default = "SectorMap::default_industry")]
    pub industry_sectors: SectorMap,

    #[serde(default = "SectorMap::default_theme")]
    pub theme_sectors: SectorMap,

    #[serde(default)]
    pub ranking: RankPolicy,
}

impl ScoringRules {
    /// Load rules from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read rules file: {:?}", path.as_ref()))?;

        let rules = Self::from_json(&content)
            .with_context(|| format!("Invalid rules file: {:?}", path.as_ref()))?;

        Ok(rules)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let rules: ScoringRules =
            serde_json::from_str(content).context("Failed to parse rules JSON")?;
        rules.validate()?;
        Ok(rules)
    }

    /// Reject tables that would make classification ambiguous or meaningless
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in self.disclosure_weights.entries() {
            if entry.keyword.trim().is_empty() {
                bail!("disclosure_weights: empty keyword");
            }
            if !seen.insert(entry.keyword.as_str()) {
                bail!("disclosure_weights: duplicate keyword '{}'", entry.keyword);
            }
        }

        validate_sector_map("industry_sectors", &self.industry_sectors)?;
        validate_sector_map("theme_sectors", &self.theme_sectors)?;

        let thresholds = &self.ranking.thresholds;
        if thresholds.notable > thresholds.strong {
            bail!(
                "ranking.thresholds: notable ({}) is above strong ({})",
                thresholds.notable,
                thresholds.strong
            );
        }

        for label in &self.ranking.priority_sectors {
            if !self.theme_sectors.labels().any(|l| l == label.trim()) {
                tracing::warn!(label = %label, "priority sector is not a theme label; it will never match");
            }
        }

        Ok(())
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        ScoringRules {
            disclosure_weights: KeywordWeights::default(),
            industry_sectors: SectorMap::default_industry(),
            theme_sectors: SectorMap::default_theme(),
            ranking: RankPolicy::default(),
        }
    }
}

fn validate_sector_map(name: &str, map: &SectorMap) -> Result<()> {
    let mut labels = HashSet::new();

    for rule in map.rules() {
        let label = rule.label.trim();
        if label.is_empty() {
            bail!("{}: empty sector label", name);
        }
        if label == crate::classifier::UNCLASSIFIED_LABEL {
            bail!("{}: '{}' is reserved for unclassified titles", name, label);
        }
        if !labels.insert(label) {
            bail!("{}: duplicate sector '{}'", name, label);
        }
        if rule.keywords.is_empty() {
            bail!("{}: sector '{}' has no keywords", name, label);
        }
        if rule.keywords.iter().any(|k| k.trim().is_empty()) {
            bail!("{}: sector '{}' has an empty keyword", name, label);
        }
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
