// 📊 Entity Summary - Running cross-day record per entity
//
// Merge policy:
//   new entity            → count 1, first_seen = last_seen = run date
//   seen before run date  → count + 1, last_seen = run date
//   seen on run date      → count unchanged (same day already counted)
//   absent today          → carried forward untouched
// In every appearing case name, industry, sector, tier and score are
// overwritten with today's representative. A run date older than an entity's
// last_seen is refused as OutOfOrderRun.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::batch::AnnotatedRecord;
use crate::classifier::SectorLabel;
use crate::deduplication::dedup_by_entity;
use crate::error::{EngineError, StaleEntity};
use crate::ranker::Tier;
use crate::record::EntityId;

/// Summary keyed by entity; ordered so persisted output is stable
pub type SummaryMap = BTreeMap<EntityId, EntitySummary>;

// ============================================================================
// ENTITY SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub entity_id: EntityId,
    /// Latest known display name
    pub entity_name: String,
    pub industry: SectorLabel,
    pub sector: SectorLabel,
    pub tier: Tier,
    pub composite_score: u32,
    /// Number of distinct run days with at least one disclosure
    pub appearance_count: u32,
    /// Never changes once set
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
}

impl EntitySummary {
    /// First appearance of an entity
    pub fn first_appearance(today: &AnnotatedRecord, run_date: NaiveDate) -> Self {
        EntitySummary {
            entity_id: today.record.entity_id.clone(),
            entity_name: today.record.entity_name.clone(),
            industry: today.industry.clone(),
            sector: today.sector.clone(),
            tier: today.tier,
            composite_score: today.composite_score,
            appearance_count: 1,
            first_seen: run_date,
            last_seen: run_date,
        }
    }

    /// Fold a later (or same-day) appearance into a copy of this summary
    pub fn with_appearance(&self, today: &AnnotatedRecord, run_date: NaiveDate) -> Self {
        let already_counted = run_date == self.last_seen;

        EntitySummary {
            entity_id: self.entity_id.clone(),
            entity_name: today.record.entity_name.clone(),
            industry: today.industry.clone(),
            sector: today.sector.clone(),
            tier: today.tier,
            composite_score: today.composite_score,
            appearance_count: if already_counted {
                self.appearance_count
            } else {
                self.appearance_count.saturating_add(1)
            },
            first_seen: self.first_seen,
            last_seen: run_date,
        }
    }
}

// ============================================================================
// MERGE
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    /// Entities seen for the first time
    pub created: usize,
    /// Known entities counted for a new day
    pub updated: usize,
    /// Known entities already counted for this run date
    pub refreshed: usize,
    /// Known entities absent from today's batch
    pub carried: usize,
}

impl MergeStats {
    pub fn appeared(&self) -> usize {
        self.created + self.updated + self.refreshed
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub summary: SummaryMap,
    pub stats: MergeStats,
}

/// Fold today's annotated batch into the prior summary
///
/// Pure: `prior` is never modified, and either the whole new map comes back
/// or an error does.
pub fn merge(
    prior: &SummaryMap,
    todays_annotated: &[AnnotatedRecord],
    run_date: NaiveDate,
) -> Result<MergeOutcome, EngineError> {
    let representatives = dedup_by_entity(todays_annotated)?;

    let stale: Vec<StaleEntity> = representatives
        .iter()
        .filter_map(|rep| prior.get(&rep.record.entity_id))
        .filter(|existing| run_date < existing.last_seen)
        .map(|existing| StaleEntity {
            entity_id: existing.entity_id.clone(),
            last_seen: existing.last_seen,
        })
        .collect();

    if !stale.is_empty() {
        return Err(EngineError::OutOfOrderRun { run_date, stale });
    }

    let mut summary = prior.clone();
    let mut stats = MergeStats::default();

    for rep in &representatives {
        let next = match prior.get(&rep.record.entity_id) {
            None => {
                stats.created += 1;
                EntitySummary::first_appearance(rep, run_date)
            }
            Some(existing) => {
                if existing.last_seen == run_date {
                    stats.refreshed += 1;
                } else {
                    stats.updated += 1;
                }
                existing.with_appearance(rep, run_date)
            }
        };
        summary.insert(next.entity_id.clone(), next);
    }

    stats.carried = prior.len() - stats.updated - stats.refreshed;

    info!(
        %run_date,
        created = stats.created,
        updated = stats.updated,
        refreshed = stats.refreshed,
        carried = stats.carried,
        total = summary.len(),
        "merged daily batch into summary"
    );

    Ok(MergeOutcome { summary, stats })
}

// ============================================================================
// TESTS
// ============================================================================
