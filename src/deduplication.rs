// 🔍 Daily Deduplication - One representative disclosure per entity per day
//
// Which record survives must not depend on batch order. Ordering, best first:
//   1. highest composite score
//   2. smallest report id (a record without one sorts before any id)
//   3. smallest title
//   4. smallest entity name

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::batch::AnnotatedRecord;
use crate::classifier::SectorLabel;
use crate::error::EngineError;
use crate::ranker::Tier;
use crate::record::EntityId;

/// Compare two same-entity candidates; `Less` means `a` is preferred
pub fn representative_order(a: &AnnotatedRecord, b: &AnnotatedRecord) -> Ordering {
    b.composite_score
        .cmp(&a.composite_score)
        .then_with(|| a.record.report_id.cmp(&b.record.report_id))
        .then_with(|| a.record.title.cmp(&b.record.title))
        .then_with(|| a.record.entity_name.cmp(&b.record.entity_name))
}

/// Fields a representative contributes to the summary
fn summary_projection(a: &AnnotatedRecord) -> (&str, &SectorLabel, &SectorLabel, Tier, u32) {
    (
        a.record.entity_name.as_str(),
        &a.industry,
        &a.sector,
        a.tier,
        a.composite_score,
    )
}

/// Collapse a day's annotated batch to one record per entity
///
/// Single pass with a hash map; the result is sorted by entity id. Fails with
/// `AmbiguousTie` only if two candidates order as equal yet would write
/// different summary values.
pub fn dedup_by_entity(annotated: &[AnnotatedRecord]) -> Result<Vec<AnnotatedRecord>, EngineError> {
    let mut best: HashMap<&EntityId, &AnnotatedRecord> = HashMap::with_capacity(annotated.len());

    for candidate in annotated {
        let id = &candidate.record.entity_id;
        match best.get(id).copied() {
            None => {
                best.insert(id, candidate);
            }
            Some(current) => match representative_order(candidate, current) {
                Ordering::Less => {
                    best.insert(id, candidate);
                }
                Ordering::Greater => {}
                Ordering::Equal => {
                    if summary_projection(candidate) != summary_projection(current) {
                        return Err(EngineError::AmbiguousTie {
                            entity_id: id.clone(),
                        });
                    }
                }
            },
        }
    }

    let mut picked: Vec<AnnotatedRecord> = best.into_values().cloned().collect();
    picked.sort_by(|a, b| a.record.entity_id.cmp(&b.record.entity_id));

    debug!(
        records = annotated.len(),
        entities = picked.len(),
        collapsed = annotated.len() - picked.len(),
        "deduplicated batch by entity"
    );

    Ok(picked)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawDisclosure;
    use crate::rules::ScoringRules;

    fn annotated(id: &str, name: &str, title: &str, report_id: Option<&str>) -> AnnotatedRecord {
        let mut raw = RawDisclosure::new(id, name, title, "2024-03-01");
        raw.report_id = report_id.map(str::to_string);
        AnnotatedRecord::annotate(raw.validate(0).unwrap(), &ScoringRules::default())
    }

    #[test]
    fn test_one_record_per_entity() {
        let batch = vec![
            annotated("005930", "Samsung", "MOU", None),
            annotated("000660", "SK hynix", "승인", None),
            annotated("5930", "Samsung", "공급계약", None),
            annotated("005930", "Samsung", "", None),
        ];

        let picked = dedup_by_entity(&batch).unwrap();
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].record.entity_id.as_str(), "000660");
        assert_eq!(picked[1].record.entity_id.as_str(), "005930");
        assert_eq!(picked[1].record.title, "공급계약");
    }

    #[test]
    fn test_highest_composite_wins_regardless_of_order() {
        let low = annotated("005930", "Samsung", "MOU", Some("1"));
        let high = annotated("005930", "Samsung", "전력 공급계약", Some("2"));

        let forward = dedup_by_entity(&[low.clone(), high.clone()]).unwrap();
        let backward = dedup_by_entity(&[high.clone(), low]).unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward[0], high);
        assert_eq!(forward[0].sector, SectorLabel::named("AI 전력 인프라"));
    }

    #[test]
    fn test_equal_scores_fall_back_to_report_id() {
        let a = annotated("005930", "Samsung", "매출 공시", Some("20240301000200"));
        let b = annotated("005930", "Samsung", "승인 공시", Some("20240301000100"));
        assert_eq!(a.composite_score, b.composite_score);

        let picked = dedup_by_entity(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(picked[0].record.report_id.as_deref(), Some("20240301000100"));

        let picked = dedup_by_entity(&[b, a]).unwrap();
        assert_eq!(picked[0].record.report_id.as_deref(), Some("20240301000100"));
    }

    fn winner_both_ways(a: &AnnotatedRecord, b: &AnnotatedRecord) -> AnnotatedRecord {
        let forward = dedup_by_entity(&[a.clone(), b.clone()]).unwrap();
        let backward = dedup_by_entity(&[b.clone(), a.clone()]).unwrap();
        assert_eq!(forward, backward);
        forward[0].clone()
    }

    #[test]
    fn test_missing_report_id_sorts_first() {
        let without = annotated("005930", "Samsung", "MOU", None);
        let with = annotated("005930", "Samsung", "MOU", Some("20240301000100"));

        let picked = winner_both_ways(&without, &with);
        assert_eq!(picked.record.report_id, None);
    }

    #[test]
    fn test_equal_report_ids_fall_back_to_title() {
        let a = annotated("005930", "Samsung", "승인 공시", Some("1"));
        let b = annotated("005930", "Samsung", "매출 공시", Some("1"));
        assert_eq!(a.composite_score, b.composite_score);

        let picked = winner_both_ways(&a, &b);
        assert_eq!(picked.record.title, "매출 공시");
    }

    #[test]
    fn test_equal_titles_fall_back_to_entity_name() {
        let a = annotated("005930", "Samsung Electronics", "MOU", Some("1"));
        let b = annotated("005930", "Samsung", "MOU", Some("1"));

        let picked = winner_both_ways(&a, &b);
        assert_eq!(picked.record.entity_name, "Samsung");
    }

    #[test]
    fn test_identical_duplicates_are_not_ambiguous() {
        let a = annotated("005930", "Samsung", "MOU", Some("1"));
        let picked = dedup_by_entity(&[a.clone(), a.clone(), a]).unwrap();
        assert_eq!(picked.len(), 1);
    }

    #[test]
    fn test_conflicting_equal_candidates_signal_ambiguous_tie() {
        let a = annotated("005930", "Samsung", "MOU", Some("1"));
        let mut b = a.clone();
        // Same ordering key, different sector: only a hand-built record can do this
        b.sector = SectorLabel::named("양자");

        let err = dedup_by_entity(&[a, b]).unwrap_err();
        assert_eq!(
            err,
            EngineError::AmbiguousTie {
                entity_id: EntityId::new("005930")
            }
        );
    }

    #[test]
    fn test_empty_batch() {
        assert!(dedup_by_entity(&[]).unwrap().is_empty());
    }
}
