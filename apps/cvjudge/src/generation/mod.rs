//! Cover-letter generation — fills the body column of the base sheet.
//!
//! Flow per row: collect attributes → build prompt → draw temperature → generate → persist.
//!
//! Resumable the same way judging is: the output file is rewritten after every row,
//! and a rerun loads it instead of the input and skips rows that already have a body.

use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::cover_letter_prompt;
use crate::llm_client::TextGenerator;
use crate::store::Sheet;

#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub body_column: String,
    pub min_temperature: f32,
    pub max_temperature: f32,
    pub seed: Option<u64>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            body_column: "Generated_Cover_Letter".to_string(),
            min_temperature: 0.51,
            max_temperature: 0.71,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub generated: usize,
    pub skipped: usize,
}

pub struct CoverLetterStage {
    generator: Arc<dyn TextGenerator>,
    options: GenerationOptions,
    rng: StdRng,
}

impl CoverLetterStage {
    pub fn new(generator: Arc<dyn TextGenerator>, options: GenerationOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            generator,
            options,
            rng,
        }
    }

    fn temperature(&mut self) -> f32 {
        let (min, max) = (self.options.min_temperature, self.options.max_temperature);
        if min == max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    pub async fn run(&mut self, input: &Path, output: &Path) -> Result<GenerationSummary, AppError> {
        let (min, max) = (self.options.min_temperature, self.options.max_temperature);
        if !(min.is_finite() && max.is_finite() && 0.0 <= min && min <= max) {
            return Err(AppError::Config(format!(
                "temperature range [{min}, {max}] is not valid"
            )));
        }

        let mut sheet = if output.exists() {
            info!("Resuming generation from {}", output.display());
            Sheet::read(output)?
        } else {
            info!("Loading {}...", input.display());
            Sheet::read(input)?
        };
        let body_idx = match sheet.column_index(&self.options.body_column) {
            Some(idx) => idx,
            None => sheet.add_column(&self.options.body_column, ""),
        };

        let mut summary = GenerationSummary::default();
        for row in 0..sheet.rows.len() {
            if !sheet.rows[row][body_idx].trim().is_empty() {
                summary.skipped += 1;
                continue;
            }

            info!("Generating cover letter for row {}...", row + 1);
            let attributes: Vec<(&str, &str)> = sheet
                .headers
                .iter()
                .zip(&sheet.rows[row])
                .enumerate()
                .filter(|(i, _)| *i != body_idx)
                .map(|(_, (key, value))| (key.as_str(), value.as_str()))
                .collect();
            let prompt = cover_letter_prompt(&attributes);
            let temperature = self.temperature();

            let letter = match self.generator.generate(&prompt, temperature).await {
                Ok(letter) => letter,
                Err(e) => {
                    error!("Error occurred at row {}: {e}. Saving progress and stopping.", row + 1);
                    sheet.write_atomic(output)?;
                    return Err(AppError::Service {
                        judge: self.generator.model().to_string(),
                        source: e,
                    });
                }
            };

            if letter.trim().is_empty() {
                warn!("Row {} got a blank letter, leaving it for the next run", row + 1);
                continue;
            }
            sheet.rows[row][body_idx] = letter.trim().to_string();
            sheet.write_atomic(output)?;
            summary.generated += 1;
        }

        info!(
            "Generation finished: {} generated, {} already present",
            summary.generated, summary.skipped
        );
        Ok(summary)
    }
}
