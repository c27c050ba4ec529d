// ⭐ Composite Ranker - Sector bonus + disclosure score → tier and group
// Tier and group share thresholds; group is the tier as a bucket id

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::classifier::SectorLabel;

// ============================================================================
// TIER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    None,
    Notable,
    Strong,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::None => "NONE",
            Tier::Notable => "NOTABLE",
            Tier::Strong => "STRONG",
        }
    }

    /// Display mark used in the daily tables
    pub fn symbol(&self) -> &'static str {
        match self {
            Tier::None => "",
            Tier::Notable => "☆",
            Tier::Strong => "★",
        }
    }

    pub fn for_score(composite: u32, thresholds: &Thresholds) -> Self {
        if composite >= thresholds.strong {
            Tier::Strong
        } else if composite >= thresholds.notable {
            Tier::Notable
        } else {
            Tier::None
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "NONE" | "" => Ok(Tier::None),
            "NOTABLE" | "☆" => Ok(Tier::Notable),
            "STRONG" | "★" => Ok(Tier::Strong),
            other => Err(format!("unknown tier '{}'", other)),
        }
    }
}

// ============================================================================
// GROUP
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Group {
    #[serde(rename = "TOP_A")]
    TopA,
    #[serde(rename = "TOP_B")]
    TopB,
    #[serde(rename = "TOP_C")]
    TopC,
}

impl Group {
    pub const ALL: [Group; 3] = [Group::TopA, Group::TopB, Group::TopC];

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::TopA => "TOP_A",
            Group::TopB => "TOP_B",
            Group::TopC => "TOP_C",
        }
    }
}

impl From<Tier> for Group {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Strong => Group::TopA,
            Tier::Notable => Group::TopB,
            Tier::None => Group::TopC,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// RANK POLICY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorBonus {
    /// Bonus for the priority themes
    pub priority: u32,
    /// Bonus for any other named sector
    pub standard: u32,
    /// Baseline for unclassified titles
    pub unclassified: u32,
}

impl Default for SectorBonus {
    fn default() -> Self {
        SectorBonus {
            priority: 70,
            standard: 50,
            unclassified: 20,
        }
    }
}

/// Inclusive lower bounds for STRONG and NOTABLE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub strong: u32,
    pub notable: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            strong: 120,
            notable: 90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    pub composite_score: u32,
    pub tier: Tier,
    pub group: Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankPolicy {
    #[serde(default = "default_priority_sectors")]
    pub priority_sectors: Vec<String>,
    #[serde(default)]
    pub bonus: SectorBonus,
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl RankPolicy {
    pub fn sector_bonus(&self, sector: &SectorLabel) -> u32 {
        match sector {
            SectorLabel::Unclassified => self.bonus.unclassified,
            SectorLabel::Named(label) if self.priority_sectors.iter().any(|p| p.trim() == label.as_str()) => {
                self.bonus.priority
            }
            SectorLabel::Named(_) => self.bonus.standard,
        }
    }

    pub fn rank(&self, sector: &SectorLabel, disclosure_score: u32) -> Ranking {
        let composite_score = self.sector_bonus(sector).saturating_add(disclosure_score);
        let tier = Tier::for_score(composite_score, &self.thresholds);

        Ranking {
            composite_score,
            tier,
            group: Group::from(tier),
        }
    }
}

fn default_priority_sectors() -> Vec<String> {
    vec!["AI 전력 인프라".to_string(), "우주·발사체".to_string()]
}

impl Default for RankPolicy {
    fn default() -> Self {
        RankPolicy {
            priority_sectors: default_priority_sectors(),
            bonus: SectorBonus::default(),
            thresholds: Thresholds::default(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tier_and_group(composite: u32) -> (Tier, Group) {
        let tier = Tier::for_score(composite, &Thresholds::default());
        (tier, Group::from(tier))
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(tier_and_group(150), (Tier::Strong, Group::TopA));
        assert_eq!(tier_and_group(95), (Tier::Notable, Group::TopB));
        assert_eq!(tier_and_group(50), (Tier::None, Group::TopC));
    }

    #[test]
    fn test_tier_boundaries_are_inclusive() {
        assert_eq!(tier_and_group(120), (Tier::Strong, Group::TopA));
        assert_eq!(tier_and_group(119), (Tier::Notable, Group::TopB));
        assert_eq!(tier_and_group(90), (Tier::Notable, Group::TopB));
        assert_eq!(tier_and_group(89), (Tier::None, Group::TopC));
    }

    #[test]
    fn test_sector_bonus_levels() {
        let policy = RankPolicy::default();
        assert_eq!(policy.sector_bonus(&SectorLabel::named("우주·발사체")), 70);
        assert_eq!(policy.sector_bonus(&SectorLabel::named("양자")), 50);
        assert_eq!(policy.sector_bonus(&SectorLabel::Unclassified), 20);
    }

    #[test]
    fn test_rank_combines_bonus_and_score() {
        let policy = RankPolicy::default();

        let strong = policy.rank(&SectorLabel::named("AI 전력 인프라"), 80);
        assert_eq!(strong.composite_score, 150);
        assert_eq!(strong.tier, Tier::Strong);
        assert_eq!(strong.group, Group::TopA);

        let notable = policy.rank(&SectorLabel::named("차세대 신약"), 40);
        assert_eq!(notable.composite_score, 90);
        assert_eq!(notable.tier, Tier::Notable);

        let plain = policy.rank(&SectorLabel::Unclassified, 10);
        assert_eq!(plain.composite_score, 30);
        assert_eq!(plain.group, Group::TopC);
    }

    #[test]
    fn test_tier_parses_labels_and_symbols() {
        assert_eq!("STRONG".parse::<Tier>().unwrap(), Tier::Strong);
        assert_eq!("☆".parse::<Tier>().unwrap(), Tier::Notable);
        assert_eq!("".parse::<Tier>().unwrap(), Tier::None);
        assert!("GOLD".parse::<Tier>().is_err());
    }

    #[test]
    fn test_group_serializes_as_bucket_id() {
        assert_eq!(serde_json::to_string(&Group::TopB).unwrap(), "\"TOP_B\"");
        assert_eq!(serde_json::to_string(&Tier::Notable).unwrap(), "\"NOTABLE\"");
    }
}
