// ⚠️ Engine Errors - Conditions the scoring core reports to its caller
// Nothing here is swallowed: the caller decides whether to abort or skip

use chrono::NaiveDate;
use std::fmt;

use crate::record::EntityId;

/// An entity whose stored last-seen date is later than the run being merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleEntity {
    pub entity_id: EntityId,
    pub last_seen: NaiveDate,
}

impl fmt::Display for StaleEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (last seen {})", self.entity_id, self.last_seen)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// A disclosure record is missing a required field or carries an unusable value
    #[error("invalid record #{index}: {field} {problem}{}", entity_suffix(.entity))]
    InvalidRecord {
        index: usize,
        field: &'static str,
        problem: String,
        entity: Option<String>,
    },

    /// Merge was asked to apply a run date older than an entity's last-seen date
    #[error("out-of-order run for {run_date}: {} entity(ies) already seen later: {}", .stale.len(), join_stale(.stale))]
    OutOfOrderRun {
        run_date: NaiveDate,
        stale: Vec<StaleEntity>,
    },

    /// Two different same-day candidates compared equal under the dedup ordering
    #[error("ambiguous tie while picking daily representative for {entity_id}")]
    AmbiguousTie { entity_id: EntityId },
}

impl EngineError {
    pub fn invalid(index: usize, field: &'static str, problem: impl Into<String>, entity: Option<&str>) -> Self {
        EngineError::InvalidRecord {
            index,
            field,
            problem: problem.into(),
            entity: entity.map(str::to_string),
        }
    }

    /// Entity ids an `OutOfOrderRun` refers to (empty for other variants)
    pub fn stale_entities(&self) -> Vec<EntityId> {
        match self {
            EngineError::OutOfOrderRun { stale, .. } => {
                stale.iter().map(|s| s.entity_id.clone()).collect()
            }
            _ => Vec::new(),
        }
    }
}

fn entity_suffix(entity: &Option<String>) -> String {
    match entity {
        Some(e) => format!(" (entity {})", e),
        None => String::new(),
    }
}

fn join_stale(stale: &[StaleEntity]) -> String {
    stale
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
