// 🗂️ Batch Classifier - Score, classify and rank one day's disclosures
// Output order follows input order; bad rows are reported, never dropped silently

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classifier::SectorLabel;
use crate::error::EngineError;
use crate::ranker::{Group, Tier};
use crate::record::{DisclosureRecord, RawDisclosure};
use crate::rules::ScoringRules;

// ============================================================================
// ANNOTATED RECORD
// ============================================================================

/// A disclosure plus everything derived from its title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    pub record: DisclosureRecord,
    pub disclosure_score: u32,
    /// Industry bucket (informational, does not feed the ranking)
    pub industry: SectorLabel,
    /// Theme bucket; this is the sector the ranker scores
    pub sector: SectorLabel,
    pub composite_score: u32,
    pub tier: Tier,
    pub group: Group,
}

impl AnnotatedRecord {
    /// Derive every annotation from the record's title
    pub fn annotate(record: DisclosureRecord, rules: &ScoringRules) -> Self {
        let disclosure_score = rules.disclosure_weights.score(&record.title);
        let industry = rules.industry_sectors.classify(&record.title);
        let sector = rules.theme_sectors.classify(&record.title);
        let ranking = rules.ranking.rank(&sector, disclosure_score);

        AnnotatedRecord {
            record,
            disclosure_score,
            industry,
            sector,
            composite_score: ranking.composite_score,
            tier: ranking.tier,
            group: ranking.group,
        }
    }
}

// ============================================================================
// BATCH OUTCOME
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Valid rows, annotated, in input order
    pub annotated: Vec<AnnotatedRecord>,
    /// One `InvalidRecord` per rejected row
    pub rejected: Vec<EngineError>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.annotated.len() + self.rejected.len()
    }

    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Annotate every record in the batch independently
pub fn classify_batch(records: &[RawDisclosure], rules: &ScoringRules) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for (index, raw) in records.iter().enumerate() {
        match raw.validate(index) {
            Ok(record) => outcome.annotated.push(AnnotatedRecord::annotate(record, rules)),
            Err(err) => {
                warn!(error = %err, "rejected disclosure record");
                outcome.rejected.push(err);
            }
        }
    }

    if let Some(top) = outcome.annotated.iter().map(|a| a.composite_score).max() {
        debug!(top_composite = top, "batch scored");
    }
    info!(
        total = records.len(),
        annotated = outcome.annotated.len(),
        rejected = outcome.rejected.len(),
        "classified disclosure batch"
    );

    outcome
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotate_single_record() {
        let rules = ScoringRules::default();
        let record = RawDisclosure::new("005930", "Samsung", "위성 발사체 공급계약", "2024-03-01")
            .validate(0)
            .unwrap();

        let annotated = AnnotatedRecord::annotate(record, &rules);
        assert_eq!(annotated.disclosure_score, 40);
        assert_eq!(annotated.industry, SectorLabel::named("운수장비"));
        assert_eq!(annotated.sector, SectorLabel::named("우주·발사체"));
        assert_eq!(annotated.composite_score, 110);
        assert_eq!(annotated.tier, Tier::Notable);
        assert_eq!(annotated.group, Group::TopB);
    }

    #[test]
    fn test_batch_preserves_input_order() {
        let rules = ScoringRules::default();
        let records = vec![
            RawDisclosure::new("000001", "A", "MOU", "2024-03-01"),
            RawDisclosure::new("000002", "B", "전력 임상 승인", "2024-03-01"),
            RawDisclosure::new("000003", "C", "", "2024-03-01"),
        ];

        let outcome = classify_batch(&records, &rules);
        assert!(outcome.is_clean());

        let ids: Vec<&str> = outcome
            .annotated
            .iter()
            .map(|a| a.record.entity_id.as_str())
            .collect();
        assert_eq!(ids, vec!["000001", "000002", "000003"]);

        // 70 (priority theme) + 40 + 40
        assert_eq!(outcome.annotated[1].composite_score, 150);
        assert_eq!(outcome.annotated[1].tier, Tier::Strong);

        // Empty title: score 0, unclassified baseline 20
        assert_eq!(outcome.annotated[2].disclosure_score, 0);
        assert_eq!(outcome.annotated[2].sector, SectorLabel::Unclassified);
        assert_eq!(outcome.annotated[2].composite_score, 20);
    }

    #[test]
    fn test_invalid_rows_reported_and_rest_processed() {
        let rules = ScoringRules::default();
        let mut missing_name = RawDisclosure::new("000002", "B", "MOU", "2024-03-01");
        missing_name.entity_name = None;

        let records = vec![
            RawDisclosure::new("000001", "A", "MOU", "2024-03-01"),
            missing_name,
            RawDisclosure::new("000003", "C", "승인", "2024-03-01"),
        ];

        let outcome = classify_batch(&records, &rules);
        assert_eq!(outcome.annotated.len(), 2);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.total(), 3);
        assert!(matches!(
            &outcome.rejected[0],
            EngineError::InvalidRecord { index: 1, field: "entity_name", .. }
        ));
    }

    #[test]
    fn test_batch_is_deterministic() {
        let rules = ScoringRules::default();
        let records = vec![
            RawDisclosure::new("005930", "Samsung", "신규사업 공급계약 체결", "2024-03-01"),
            RawDisclosure::new("000660", "SK hynix", "AI 반도체 매출", "2024-03-01"),
        ];

        let first = classify_batch(&records, &rules);
        let second = classify_batch(&records, &rules);
        assert_eq!(first.annotated, second.annotated);
    }
}
