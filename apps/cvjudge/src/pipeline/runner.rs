//! Checkpointing Pipeline — drives every judge over the table, one record at a time.
//!
//! Flow per record: score → pick counterpart → compare → write cells → maybe persist.
//!
//! Per record and judge the cells define the state: Pending → Scored → Compared.
//! A cell that is already filled is never written again, so a rerun after a crash
//! only redoes the work that was not flushed.
//!
//! On a service failure the table is persisted first and the error is returned.
//! There is no retry; the operator restarts and the resume scan picks up.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::judge::{Judge, JudgeMode};
use crate::llm_client::LlmError;
use crate::pipeline::governor::RateLimitGovernor;
use crate::pipeline::pairing::PairingStrategy;
use crate::store::{self, Counterpart, RecordState, Table, Winner};

/// How often the whole table is written to the progress file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointPolicy {
    /// After every processed record. Bounds rework after a crash to one record.
    PerRecord,
    /// After every `n` processed records, and once at the end.
    PerBatch(usize),
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub pairing: PairingStrategy,
    pub checkpoint: CheckpointPolicy,
    /// Where to start when the resume scan finds no unfinished record.
    pub start_offset: usize,
    pub seed: Option<u64>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            pairing: PairingStrategy::Sequential,
            checkpoint: CheckpointPolicy::PerRecord,
            start_offset: 0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records that needed at least one judge call.
    pub processed: usize,
    /// Records every judge had already finished.
    pub skipped: usize,
    /// Records left unfinished because a combined reply was missing a field.
    pub incomplete: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Skipped,
    Processed { incomplete: bool },
}

pub struct Pipeline {
    table: Table,
    judges: Vec<Judge>,
    progress_path: PathBuf,
    options: PipelineOptions,
    governor: RateLimitGovernor,
    rng: StdRng,
}

impl Pipeline {
    pub fn new(
        mut table: Table,
        judges: Vec<Judge>,
        progress_path: impl Into<PathBuf>,
        options: PipelineOptions,
        governor: RateLimitGovernor,
    ) -> Self {
        let names: Vec<String> = judges.iter().map(|j| j.name().to_string()).collect();
        table.ensure_judges(&names);

        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            table,
            judges,
            progress_path: progress_path.into(),
            options,
            governor,
            rng,
        }
    }

    #[cfg(test)]
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    /// Processes every unfinished record from the resume point to the end of the table.
    pub async fn run(&mut self) -> Result<RunSummary, AppError> {
        let len = self.table.len();
        self.options.pairing.validate(len)?;
        if let CheckpointPolicy::PerBatch(0) = self.options.checkpoint {
            return Err(AppError::Config("checkpoint batch size must be at least 1".to_string()));
        }

        let start = self.start_position();
        if start < len {
            info!("Resuming from row {}", start + 1);
        } else {
            info!("Nothing left to do, all {len} rows are finished");
        }

        let mut summary = RunSummary::default();
        let mut unsaved = 0usize;

        for position in start..len {
            let outcome = match self.process_record(position).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Error occurred at row {}: {e}. Saving progress and stopping.", position + 1);
                    match store::persist(&self.table, &self.progress_path) {
                        Ok(()) => info!("Progress saved to {}", self.progress_path.display()),
                        Err(save_err) => error!("Saving progress failed: {save_err}"),
                    }
                    return Err(e);
                }
            };

            match outcome {
                Outcome::Skipped => {
                    summary.skipped += 1;
                    continue;
                }
                Outcome::Processed { incomplete } => {
                    summary.processed += 1;
                    if incomplete {
                        summary.incomplete += 1;
                    }
                    unsaved += 1;
                }
            }

            let flush = match self.options.checkpoint {
                CheckpointPolicy::PerRecord => true,
                CheckpointPolicy::PerBatch(n) => unsaved >= n,
            };
            if flush {
                store::persist(&self.table, &self.progress_path)?;
                unsaved = 0;
                info!("Progress saved after row {}", position + 1);
            }

            self.governor.record_processed().await;
        }

        if unsaved > 0 {
            store::persist(&self.table, &self.progress_path)?;
            info!("Progress saved after final partial batch");
        }

        info!(
            "Run finished: {} processed, {} already done, {} incomplete",
            summary.processed, summary.skipped, summary.incomplete
        );
        Ok(summary)
    }

    /// Counterpart position for `position`: an existing one is reused, never re-drawn.
    fn resolve_counterpart(&mut self, position: usize) -> Result<Option<usize>, AppError> {
        match self.table.record(position).counterpart {
            Some(Counterpart::Record(id)) => self
                .table
                .records()
                .iter()
                .position(|r| r.id == id)
                .map(Some)
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "row {} points at record {id}, which is not in the table",
                        position + 1
                    ))
                }),
            Some(Counterpart::NotApplicable) => Ok(None),
            None => self
                .options
                .pairing
                .counterpart(position, self.table.len(), &mut self.rng),
        }
    }

    /// Lowest position with an empty counterpart, else the start offset. Rows before it are
    /// revisited only when a judge added since the last run has no results there yet.
    fn start_position(&self) -> usize {
        let resume = self.table.resume_position(self.options.start_offset);
        (0..resume.min(self.table.len()))
            .find(|p| !self.pending_judges(*p).is_empty())
            .unwrap_or(resume)
    }

    /// Whether a comparison can happen at `position` at all.
    fn can_pair(&self, position: usize) -> bool {
        match self.table.record(position).counterpart {
            Some(Counterpart::Record(_)) => true,
            Some(Counterpart::NotApplicable) => false,
            None => {
                self.options.pairing == PairingStrategy::Random || position + 1 < self.table.len()
            }
        }
    }

    /// Indices into `self.judges` of the judges with work left at `position`.
    fn pending_judges(&self, position: usize) -> Vec<usize> {
        let paired = self.can_pair(position);
        self.judges
            .iter()
            .enumerate()
            .filter(|(_, judge)| {
                let state = self.table.result(position, self.judge_slot(judge)).state();
                match (judge.mode(), paired) {
                    (_, true) => state != RecordState::Compared,
                    (JudgeMode::Separate, false) => state == RecordState::Pending,
                    // a combined judge only ever scores as part of a comparison
                    (JudgeMode::Combined, false) => false,
                }
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn judge_slot(&self, judge: &Judge) -> usize {
        // Pipeline::new registered every judge, so the lookup cannot miss.
        self.table.judge_index(judge.name()).unwrap_or_default()
    }

    async fn process_record(&mut self, position: usize) -> Result<Outcome, AppError> {
        // Checked before drawing, so a finished row never consumes a random counterpart.
        let pending = self.pending_judges(position);
        if pending.is_empty() {
            return Ok(Outcome::Skipped);
        }

        let other = self.resolve_counterpart(position)?;
        let body = self.table.body(position).to_string();
        let other_body = other.map(|o| self.table.body(o).to_string());
        let mut incomplete = false;

        for i in pending {
            let judge = self.judges[i].clone();
            let slot = self.judge_slot(&judge);
            let service = |source: LlmError| AppError::Service {
                judge: judge.name().to_string(),
                source,
            };

            match (judge.mode(), other, other_body.as_deref()) {
                (JudgeMode::Separate, other, other_body) => {
                    if self.table.result(position, slot).score == 0 {
                        let score = judge.score(&body).await.map_err(service)?;
                        self.table.set_score(position, judge.name(), score)?;
                    }

                    if let (Some(other), Some(other_body)) = (other, other_body) {
                        let winner = judge.compare_two(&body, other_body).await.map_err(service)?;
                        self.write_pairing(position, other)?;
                        if winner.is_empty() {
                            warn!(judge = judge.name(), row = position + 1, "empty winner token");
                        } else {
                            self.table
                                .set_winner(position, judge.name(), Winner::Token(winner))?;
                        }
                    }
                }
                (JudgeMode::Combined, Some(other), Some(other_body)) => {
                    let result = judge
                        .compare_two_with_scores(&body, other_body)
                        .await
                        .map_err(service)?;

                    match result.complete() {
                        Some((score_a, score_b, winner)) => {
                            if self.table.result(position, slot).score == 0 {
                                self.table.set_score(position, judge.name(), score_a)?;
                            }
                            if self.table.result(other, slot).score == 0 {
                                self.table.set_score(other, judge.name(), score_b)?;
                            }
                            self.write_pairing(position, other)?;
                            self.table.set_winner(
                                position,
                                judge.name(),
                                Winner::Token(winner.to_string()),
                            )?;
                        }
                        None => {
                            warn!(
                                judge = judge.name(),
                                row = position + 1,
                                "reply lacked a score or winner, leaving row unfinished"
                            );
                            incomplete = true;
                        }
                    }
                }
                (JudgeMode::Combined, _, _) => {}
            }
        }

        Ok(Outcome::Processed { incomplete })
    }

    fn write_pairing(&mut self, position: usize, other: usize) -> Result<(), AppError> {
        if self.table.record(position).counterpart.is_none() {
            let id = self.table.record(other).id;
            self.table.set_counterpart(position, Counterpart::Record(id))?;
        }
        Ok(())
    }
}
