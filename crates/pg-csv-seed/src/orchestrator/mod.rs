//! Seed orchestrator - runs the stages of one seeding pass in order.
//!
//! Schema, clients, consultation, training, employments, sequences. Every
//! stage commits before the next starts; the first failure ends the run and
//! leaves earlier stages committed.

mod dry_run;

use crate::config::Config;
use crate::error::Result;
use crate::loader::{load_children, load_clients, ChildKind, LoadStats};
use crate::schema;
use crate::source::{layout, CsvSource};
use crate::target::{reconcile_sequence, PgSink, PgTarget, SequenceReport};
use chrono::{DateTime, Utc};
use deadpool_postgres::Object;
use dry_run::DryRunSink;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Seed orchestrator.
pub struct Orchestrator {
    config: Config,
    csv_dir: PathBuf,
}

/// Result of a seeding run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedResult {
    /// Unique run identifier.
    pub run_id: String,

    /// True when nothing was written.
    pub dry_run: bool,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Directory the CSV files were read from.
    pub csv_dir: PathBuf,

    /// One entry per loaded file, in load order.
    pub stages: Vec<LoadStats>,

    /// Sequence positions after reconciliation. Empty for dry runs.
    pub sequences: Vec<SequenceReport>,
}

impl SeedResult {
    /// Serialize the result as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rows written across all files.
    pub fn rows_written(&self) -> u64 {
        self.stages.iter().map(LoadStats::written).sum()
    }
}

impl Orchestrator {
    /// Validate the configuration and resolve the CSV directory.
    ///
    /// No connection is opened here, so configuration and missing-directory
    /// failures surface before any database work.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let csv_dir = config.csv_dir()?;
        Ok(Self { config, csv_dir })
    }

    /// Directory the CSV files are read from.
    pub fn csv_dir(&self) -> &Path {
        &self.csv_dir
    }

    /// Run every stage against the target database.
    pub async fn run(self) -> Result<SeedResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Starting seed run {} from {}", run_id, self.csv_dir.display());

        let target = PgTarget::connect(&self.config.target)
            .await
            .map_err(|e| e.in_stage("connect"))?;
        // One session for the whole run, returned to the pool on every exit path.
        let mut session = target.session().await?;
        let db_schema = target.schema().to_string();

        info!("Stage 1: Ensuring schema");
        schema::ensure_schema(&mut session, &db_schema, self.config.seed.embedding_dimensions)
            .await
            .map_err(|e| e.in_stage("schema"))?;

        let mut stages = Vec::with_capacity(4);

        info!("Stage 2: Loading clients");
        let stats = self
            .load_clients_file(&mut session, &db_schema)
            .await
            .map_err(|e| e.in_stage(layout::CLIENTS.table))?;
        stages.push(stats);

        info!("Stage 3: Loading consultation, training and employments");
        for kind in ChildKind::ALL {
            let stats = self
                .load_children_file(&mut session, &db_schema, kind)
                .await
                .map_err(|e| e.in_stage(kind.table()))?;
            stages.push(stats);
        }

        info!("Stage 4: Reconciling id sequences");
        let mut sequences = Vec::with_capacity(layout::ALL.len());
        for file in &layout::ALL {
            let report = reconcile_sequence(&session, &db_schema, file.table)
                .await
                .map_err(|e| e.in_stage("sequences"))?;
            sequences.push(report);
        }

        let result = self.finish(run_id, started_at, false, stages, sequences);
        info!(
            "Seed completed: {} rows written in {:.1}s",
            result.rows_written(),
            result.duration_seconds
        );
        Ok(result)
    }

    /// Read and decode every file without connecting to the database.
    ///
    /// Counts are relative to an empty database: a repeated id within a file
    /// shows up as updated (clients) or already present (children). Rows
    /// with bad identifiers fail exactly as they would in a real run.
    pub async fn dry_run(&self) -> Result<SeedResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Starting dry run {} from {}", run_id, self.csv_dir.display());

        let mut sink = DryRunSink::default();
        let mut stages = Vec::with_capacity(4);

        let rows = CsvSource::open(&self.csv_dir, &layout::CLIENTS)
            .map_err(|e| e.in_stage(layout::CLIENTS.table))?;
        let stats = load_clients(rows, &mut sink)
            .await
            .map_err(|e| e.in_stage(layout::CLIENTS.table))?;
        stages.push(stats);

        for kind in ChildKind::ALL {
            let rows = CsvSource::open(&self.csv_dir, kind.layout())
                .map_err(|e| e.in_stage(kind.table()))?;
            let stats = load_children(kind, rows, &mut sink)
                .await
                .map_err(|e| e.in_stage(kind.table()))?;
            stages.push(stats);
        }

        Ok(self.finish(run_id, started_at, true, stages, Vec::new()))
    }

    async fn load_clients_file(&self, session: &mut Object, db_schema: &str) -> Result<LoadStats> {
        let rows = CsvSource::open(&self.csv_dir, &layout::CLIENTS)?;
        let mut sink = PgSink::new(session.transaction().await?, db_schema);
        let stats = load_clients(rows, &mut sink).await?;
        sink.commit().await?;
        Ok(stats)
    }

    async fn load_children_file(
        &self,
        session: &mut Object,
        db_schema: &str,
        kind: ChildKind,
    ) -> Result<LoadStats> {
        let rows = CsvSource::open(&self.csv_dir, kind.layout())?;
        let mut sink = PgSink::new(session.transaction().await?, db_schema);
        let stats = load_children(kind, rows, &mut sink).await?;
        sink.commit().await?;
        Ok(stats)
    }

    fn finish(
        &self,
        run_id: String,
        started_at: DateTime<Utc>,
        dry_run: bool,
        stages: Vec<LoadStats>,
        sequences: Vec<SequenceReport>,
    ) -> SeedResult {
        let completed_at = Utc::now();
        SeedResult {
            run_id,
            dry_run,
            started_at,
            completed_at,
            duration_seconds: (completed_at - started_at).num_milliseconds() as f64 / 1000.0,
            csv_dir: self.csv_dir.clone(),
            stages,
            sequences,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SourceConfig, TargetConfig};
    use crate::error::{SeedError, EXIT_CONFIG_ERROR, EXIT_DATA_ERROR, EXIT_IO_ERROR, EXIT_SOURCE_DIR_MISSING};
    use std::fs;

    const CLIENTS_CSV: &str = "id,name,birth_date,resident_id,phone,age,gender,embedding,\
        business_type,join_type,join_stage,competency,desired_job,address,university,major,embedding\n\
        1,Jane Doe,1990-01-01,900101-2******,010-0000-0000,thirty,F,Bachelor,IT,walk-in,intake,SQL,\
        backend,Seoul,Korea Univ,CS,\n";

    fn config_for(dir: &Path) -> Config {
        Config {
            source: SourceConfig {
                dir: Some(dir.to_path_buf()),
            },
            target: TargetConfig {
                host: "localhost".into(),
                database: "careers".into(),
                user: "postgres".into(),
                ..TargetConfig::default()
            },
            ..Config::default()
        }
    }

    fn write_exports(dir: &Path, employments: &str) {
        fs::write(dir.join("clients.csv"), CLIENTS_CSV).unwrap();
        fs::write(dir.join("consultation.csv"), "id,client_id,summary\n1,1,intake interview\n").unwrap();
        fs::write(dir.join("training.csv"), "id,client_id,course_name\n").unwrap();
        fs::write(dir.join("employments.csv"), employments).unwrap();
    }

    #[test]
    fn test_new_rejects_missing_dir() {
        let mut config = config_for(Path::new("/definitely/not/here/pg-csv-seed"));
        let err = Orchestrator::new(config.clone()).err().unwrap();
        assert_eq!(err.exit_code(), EXIT_SOURCE_DIR_MISSING);

        config.source.dir = None;
        let err = Orchestrator::new(config).err().unwrap();
        assert_eq!(err.exit_code(), EXIT_CONFIG_ERROR);
    }

    #[tokio::test]
    async fn test_dry_run_reads_all_files() {
        let tmp = tempfile::tempdir().unwrap();
        write_exports(
            tmp.path(),
            "id,client_id,job_title,company_name,salary\n10,1,Engineer,Acme,\"n/a\"\n10,1,Other,Corp,1\n",
        );

        let orchestrator = Orchestrator::new(config_for(tmp.path())).unwrap();
        let result = orchestrator.dry_run().await.unwrap();

        assert!(result.dry_run);
        assert!(result.sequences.is_empty());
        let tables: Vec<&str> = result.stages.iter().map(|s| s.table.as_str()).collect();
        assert_eq!(tables, ["clients", "consultation", "training", "employments"]);
        assert_eq!(result.stages[0].inserted, 1);
        assert_eq!(result.stages[1].inserted, 1);
        assert_eq!(result.stages[2].rows_read, 0);
        assert_eq!(result.stages[3].inserted, 1);
        assert_eq!(result.stages[3].skipped_existing, 1);
        assert_eq!(result.rows_written(), 3);
        assert!(result.to_json().unwrap().contains("\"skipped_existing\": 1"));
    }

    #[tokio::test]
    async fn test_dry_run_missing_file_names_stage() {
        let tmp = tempfile::tempdir().unwrap();
        write_exports(tmp.path(), "id,client_id,job_title,company_name,salary\n");
        fs::remove_file(tmp.path().join("training.csv")).unwrap();

        let orchestrator = Orchestrator::new(config_for(tmp.path())).unwrap();
        let err = orchestrator.dry_run().await.unwrap_err();
        assert_eq!(err.exit_code(), EXIT_IO_ERROR);
        assert!(matches!(err, SeedError::Stage { ref stage, .. } if stage == "training"));
        assert!(err.format_detailed().contains("training.csv"));
    }

    #[tokio::test]
    async fn test_dry_run_bad_identifier_fails() {
        let tmp = tempfile::tempdir().unwrap();
        write_exports(
            tmp.path(),
            "id,client_id,job_title,company_name,salary\nten,1,Engineer,Acme,100\n",
        );

        let orchestrator = Orchestrator::new(config_for(tmp.path())).unwrap();
        let err = orchestrator.dry_run().await.unwrap_err();
        assert_eq!(err.exit_code(), EXIT_DATA_ERROR);
        assert!(matches!(err, SeedError::Stage { ref stage, .. } if stage == "employments"));
    }
}
