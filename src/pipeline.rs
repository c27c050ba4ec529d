// 🔁 Daily Pipeline - classify → merge → persist, all or nothing
//
// The SQLite write lock taken by the IMMEDIATE transaction serializes runs
// that share a summary store.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, TransactionBehavior};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::batch::{classify_batch, AnnotatedRecord};
use crate::error::EngineError;
use crate::record::{EntityId, RawDisclosure};
use crate::report::{DailyReport, DEFAULT_TOP_N};
use crate::rules::ScoringRules;
use crate::store::{
    fingerprint_batch, load_summary, record_run, runs_for_fingerprint, save_summary, RunRecord,
};
use crate::summary::{merge, MergeOutcome, MergeStats, SummaryMap};

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Groups in the daily report are cut to this many rows
    pub top_n: usize,
    /// Drop entities already seen after the run date instead of aborting
    pub skip_out_of_order: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            top_n: DEFAULT_TOP_N,
            skip_out_of_order: false,
        }
    }
}

/// Everything one daily run produced
#[derive(Debug, Clone)]
pub struct DailyRun {
    pub run_id: String,
    pub run_date: NaiveDate,
    pub annotated: Vec<AnnotatedRecord>,
    pub rejected: Vec<EngineError>,
    pub skipped: Vec<EntityId>,
    pub report: DailyReport,
    pub stats: MergeStats,
    pub summary_size: usize,
    /// Earlier run ids that merged the identical batch for this date
    pub replay_of: Vec<String>,
}

/// Run one day's batch against the summary stored in `conn`
pub fn run_daily(
    conn: &mut Connection,
    records: &[RawDisclosure],
    run_date: NaiveDate,
    rules: &ScoringRules,
    options: &RunOptions,
) -> Result<DailyRun> {
    let batch = classify_batch(records, rules);
    let fingerprint = fingerprint_batch(records)?;

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .context("Failed to lock summary store")?;

    let replay_of = runs_for_fingerprint(&tx, run_date, &fingerprint)?;
    if !replay_of.is_empty() {
        warn!(%run_date, previous = ?replay_of, "identical batch already merged for this date");
    }

    let prior = load_summary(&tx)?;
    let (outcome, skipped) = merge_with_policy(&prior, &batch.annotated, run_date, options)?;

    save_summary(&tx, &outcome.summary)?;

    let run = RunRecord::new(
        run_date,
        fingerprint,
        records.len(),
        batch.rejected.len(),
        outcome.stats,
    );
    record_run(&tx, &run)?;

    tx.commit().context("Failed to commit daily run")?;

    info!(
        run_id = %run.run_id,
        %run_date,
        entities = outcome.summary.len(),
        "daily run committed"
    );

    Ok(DailyRun {
        run_id: run.run_id,
        run_date,
        report: DailyReport::build(&batch.annotated, options.top_n),
        annotated: batch.annotated,
        rejected: batch.rejected,
        skipped,
        stats: outcome.stats,
        summary_size: outcome.summary.len(),
        replay_of,
    })
}

/// Merge, optionally retrying once without entities that would go backwards in time
fn merge_with_policy(
    prior: &SummaryMap,
    annotated: &[AnnotatedRecord],
    run_date: NaiveDate,
    options: &RunOptions,
) -> Result<(MergeOutcome, Vec<EntityId>)> {
    match merge(prior, annotated, run_date) {
        Ok(outcome) => Ok((outcome, Vec::new())),
        Err(err @ EngineError::OutOfOrderRun { .. }) if options.skip_out_of_order => {
            let stale: HashSet<EntityId> = err.stale_entities().into_iter().collect();
            warn!(%run_date, skipped = stale.len(), "skipping entities already seen after run date");

            let kept: Vec<AnnotatedRecord> = annotated
                .iter()
                .filter(|a| !stale.contains(&a.record.entity_id))
                .cloned()
                .collect();

            let outcome = merge(prior, &kept, run_date)?;
            let mut skipped: Vec<EntityId> = stale.into_iter().collect();
            skipped.sort();
            Ok((outcome, skipped))
        }
        Err(err) => Err(err.into()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
