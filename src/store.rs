use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::info;

use crate::classifier::SectorLabel;
use crate::ranker::Tier;
use crate::record::{EntityId, RawDisclosure};
use crate::summary::{EntitySummary, MergeStats, SummaryMap};

// ============================================================================
// RUN LEDGER
// ============================================================================

/// One merge run as written to the audit ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub run_date: NaiveDate,
    /// SHA-256 of the raw batch; equal fingerprints mean a replayed batch
    pub batch_fingerprint: String,
    pub record_count: usize,
    pub rejected_count: usize,
    pub entity_count: usize,
    pub stats: MergeStats,
    pub recorded_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn new(
        run_date: NaiveDate,
        batch_fingerprint: String,
        record_count: usize,
        rejected_count: usize,
        stats: MergeStats,
    ) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            run_date,
            batch_fingerprint,
            record_count,
            rejected_count,
            entity_count: stats.appeared(),
            stats,
            recorded_at: Utc::now(),
        }
    }
}

/// Fingerprint a raw batch for replay detection
pub fn fingerprint_batch(records: &[RawDisclosure]) -> Result<String> {
    let mut hasher = Sha256::new();
    for record in records {
        hasher.update(serde_json::to_vec(record)?);
        hasher.update(b"\n");
    }
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS entity_summary (
            entity_id TEXT PRIMARY KEY,
            entity_name TEXT NOT NULL,
            industry TEXT NOT NULL,
            sector TEXT NOT NULL,
            tier TEXT NOT NULL,
            composite_score INTEGER NOT NULL,
            appearance_count INTEGER NOT NULL CHECK (appearance_count > 0),
            first_seen TEXT NOT NULL,
            last_seen TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            CHECK (first_seen <= last_seen)
        )",
        [],
    )?;

    // Audit trail: one row per merge run
    conn.execute(
        "CREATE TABLE IF NOT EXISTS merge_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT UNIQUE NOT NULL,
            run_date TEXT NOT NULL,
            batch_fingerprint TEXT NOT NULL,
            record_count INTEGER NOT NULL,
            rejected_count INTEGER NOT NULL,
            entity_count INTEGER NOT NULL,
            created_count INTEGER NOT NULL,
            updated_count INTEGER NOT NULL,
            refreshed_count INTEGER NOT NULL,
            carried_count INTEGER NOT NULL,
            recorded_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_summary_last_seen ON entity_summary(last_seen)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_runs_fingerprint ON merge_runs(run_date, batch_fingerprint)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// SUMMARY
// ============================================================================

struct SummaryRow {
    entity_id: String,
    entity_name: String,
    industry: String,
    sector: String,
    tier: String,
    composite_score: u32,
    appearance_count: u32,
    first_seen: String,
    last_seen: String,
}

/// Load the whole summary; stored ids are normalized on the way in
pub fn load_summary(conn: &Connection) -> Result<SummaryMap> {
    let mut stmt = conn.prepare(
        "SELECT entity_id, entity_name, industry, sector, tier,
                composite_score, appearance_count, first_seen, last_seen
         FROM entity_summary",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(SummaryRow {
                entity_id: row.get(0)?,
                entity_name: row.get(1)?,
                industry: row.get(2)?,
                sector: row.get(3)?,
                tier: row.get(4)?,
                composite_score: row.get(5)?,
                appearance_count: row.get(6)?,
                first_seen: row.get(7)?,
                last_seen: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut summary = SummaryMap::new();
    let mut stored_ids: HashMap<EntityId, String> = HashMap::with_capacity(rows.len());

    for row in rows {
        let entity = summary_from_row(&row)
            .with_context(|| format!("Corrupt summary row for entity '{}'", row.entity_id))?;

        if let Some(earlier) = stored_ids.get(&entity.entity_id) {
            bail!(
                "Stored ids '{}' and '{}' both normalize to entity '{}'",
                earlier,
                row.entity_id,
                entity.entity_id
            );
        }
        stored_ids.insert(entity.entity_id.clone(), row.entity_id.clone());
        summary.insert(entity.entity_id.clone(), entity);
    }

    Ok(summary)
}

fn summary_from_row(row: &SummaryRow) -> Result<EntitySummary> {
    let tier: Tier = row
        .tier
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let first_seen = NaiveDate::parse_from_str(&row.first_seen, "%Y-%m-%d")
        .with_context(|| format!("bad first_seen '{}'", row.first_seen))?;
    let last_seen = NaiveDate::parse_from_str(&row.last_seen, "%Y-%m-%d")
        .with_context(|| format!("bad last_seen '{}'", row.last_seen))?;

    Ok(EntitySummary {
        entity_id: EntityId::new(&row.entity_id),
        entity_name: row.entity_name.clone(),
        industry: SectorLabel::from(row.industry.clone()),
        sector: SectorLabel::from(row.sector.clone()),
        tier,
        composite_score: row.composite_score,
        appearance_count: row.appearance_count,
        first_seen,
        last_seen,
    })
}

/// Upsert every summary row
///
/// Rows stored under a non-normalized id ("5930") are deleted first; the
/// loaded summary already holds them under the normalized key, so the upsert
/// writes them back as "005930". Run inside the caller's transaction so a
/// failed run leaves nothing behind.
pub fn save_summary(conn: &Connection, summary: &SummaryMap) -> Result<usize> {
    let legacy = legacy_ids(conn)?;
    if !legacy.is_empty() {
        let mut delete = conn.prepare("DELETE FROM entity_summary WHERE entity_id = ?1")?;
        for id in &legacy {
            delete.execute([id])?;
        }
        info!(rows = legacy.len(), "rewrote summary rows under normalized ids");
    }

    let mut stmt = conn.prepare(
        "INSERT INTO entity_summary (
            entity_id, entity_name, industry, sector, tier,
            composite_score, appearance_count, first_seen, last_seen
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(entity_id) DO UPDATE SET
            entity_name = excluded.entity_name,
            industry = excluded.industry,
            sector = excluded.sector,
            tier = excluded.tier,
            composite_score = excluded.composite_score,
            appearance_count = excluded.appearance_count,
            first_seen = excluded.first_seen,
            last_seen = excluded.last_seen,
            updated_at = CURRENT_TIMESTAMP",
    )?;

    let mut written = 0;
    for entity in summary.values() {
        stmt.execute(params![
            entity.entity_id.as_str(),
            entity.entity_name,
            entity.industry.as_str(),
            entity.sector.as_str(),
            entity.tier.as_str(),
            entity.composite_score,
            entity.appearance_count,
            entity.first_seen.to_string(),
            entity.last_seen.to_string(),
        ])?;
        written += 1;
    }

    Ok(written)
}

/// Stored ids that differ from their normalized form
fn legacy_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT entity_id FROM entity_summary")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ids
        .into_iter()
        .filter(|id| EntityId::new(id).as_str() != id.as_str())
        .collect())
}

pub fn summary_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM entity_summary", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// RUNS
// ============================================================================

/// Insert run into audit ledger
pub fn record_run(conn: &Connection, run: &RunRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO merge_runs (
            run_id, run_date, batch_fingerprint, record_count, rejected_count,
            entity_count, created_count, updated_count, refreshed_count, carried_count,
            recorded_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            run.run_id,
            run.run_date.to_string(),
            run.batch_fingerprint,
            run.record_count as i64,
            run.rejected_count as i64,
            run.entity_count as i64,
            run.stats.created as i64,
            run.stats.updated as i64,
            run.stats.refreshed as i64,
            run.stats.carried as i64,
            run.recorded_at.to_rfc3339(),
        ],
    )?;

    Ok(())
}

/// Run ids that already merged this exact batch for this date
pub fn runs_for_fingerprint(
    conn: &Connection,
    run_date: NaiveDate,
    fingerprint: &str,
) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT run_id FROM merge_runs
         WHERE run_date = ?1 AND batch_fingerprint = ?2
         ORDER BY id",
    )?;

    let ids = stmt
        .query_map(params![run_date.to_string(), fingerprint], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    Ok(ids)
}

pub fn run_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM merge_runs", [], |row| row.get(0))?;

    Ok(count)
}
