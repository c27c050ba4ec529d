// Disclosure Radar - Core Library
// Scores daily disclosures against investment themes and keeps a running per-entity summary

pub mod error;
pub mod record;
pub mod scorer;         // Keyword weights
pub mod classifier;     // First-match sector maps
pub mod ranker;         // Composite score → tier / group
pub mod rules;          // Rule set loading + validation
pub mod batch;          // Batch classifier
pub mod deduplication;  // One representative per entity per day
pub mod summary;        // Cross-day summary merge
pub mod report;         // TOP_A / TOP_B / TOP_C partition
pub mod source;         // CSV / JSON batch input
pub mod store;          // SQLite summary store + run ledger
pub mod pipeline;       // classify → merge → persist

// Re-export commonly used types
pub use error::{EngineError, StaleEntity};
pub use record::{parse_date, DisclosureRecord, EntityId, RawDisclosure};
pub use scorer::{KeywordWeight, KeywordWeights};
pub use classifier::{SectorLabel, SectorMap, SectorRule, UNCLASSIFIED_LABEL};
pub use ranker::{Group, RankPolicy, Ranking, SectorBonus, Thresholds, Tier};
pub use rules::ScoringRules;
pub use batch::{classify_batch, AnnotatedRecord, BatchOutcome};
pub use deduplication::{dedup_by_entity, representative_order};
pub use summary::{merge, EntitySummary, MergeOutcome, MergeStats, SummaryMap};
pub use report::{DailyReport, DEFAULT_TOP_N};
pub use source::{load_disclosures, load_disclosures_csv, parse_disclosures_json};
pub use store::{
    fingerprint_batch, load_summary, record_run, run_count, runs_for_fingerprint,
    save_summary, setup_database, summary_count, RunRecord,
};
pub use pipeline::{run_daily, DailyRun, RunOptions};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
