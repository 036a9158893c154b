//! Judges — named text-generation configurations that score and compare cover letters.
//!
//! A judge never validates the semantics of an answer: unparseable scores become `0`
//! and odd winner tokens are stored as-is. Only transport/service failures are errors.

pub mod parse;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::prompts::{compare_prompt, compare_with_scores_prompt, rate_prompt};
use crate::llm_client::{LlmClient, LlmError, Provider, TextGenerator};
use parse::{extract_labeled, extract_score, first_line, CV_1_SCORE_LABEL, CV_2_SCORE_LABEL, WINNER_LABEL};

/// Sampling temperature used for every judge call.
pub const JUDGE_TEMPERATURE: f32 = 0.7;

/// How a judge produces its score and winner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JudgeMode {
    /// One rating call, then one comparison call.
    #[default]
    Separate,
    /// One comparison call answering both scores and the winner.
    Combined,
}

impl FromStr for JudgeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "separate" => Ok(JudgeMode::Separate),
            "combined" => Ok(JudgeMode::Combined),
            other => Err(format!("unknown judge mode '{other}'")),
        }
    }
}

/// Parsed `[name=]provider:model[:mode]` judge descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeSpec {
    pub name: String,
    pub provider: Provider,
    pub model: String,
    pub mode: JudgeMode,
}

impl FromStr for JudgeSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, rest) = match s.split_once('=') {
            Some((name, rest)) => (Some(name.trim()), rest),
            None => (None, s),
        };

        let (provider, rest) = rest
            .split_once(':')
            .ok_or_else(|| format!("judge '{s}' must look like provider:model[:mode]"))?;
        let provider: Provider = provider.trim().parse()?;

        // Model ids may contain ':' themselves, so only a known mode suffix is split off.
        let (model, mode) = match rest.rsplit_once(':') {
            Some((model, mode)) if mode.parse::<JudgeMode>().is_ok() => {
                (model, mode.parse::<JudgeMode>()?)
            }
            _ => (rest, JudgeMode::default()),
        };

        let model = model.trim();
        if model.is_empty() {
            return Err(format!("judge '{s}' has an empty model"));
        }

        let name = match name {
            Some("") => return Err(format!("judge '{s}' has an empty name")),
            Some(name) => name.to_string(),
            None => model.to_string(),
        };
        if name.contains('~') || name.contains(',') {
            return Err(format!("judge name '{name}' may not contain '~' or ','"));
        }

        Ok(JudgeSpec {
            name,
            provider,
            model: model.to_string(),
            mode,
        })
    }
}

/// Result of a combined comparison. Each field is `None` when its label was missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoredComparison {
    pub score_a: Option<u32>,
    pub score_b: Option<u32>,
    pub winner: Option<String>,
}

impl ScoredComparison {
    /// All three fields, or nothing.
    pub fn complete(&self) -> Option<(u32, u32, &str)> {
        match (self.score_a, self.score_b, self.winner.as_deref()) {
            (Some(a), Some(b), Some(w)) => Some((a, b, w)),
            _ => None,
        }
    }
}

/// A named judge bound to one text generator.
#[derive(Clone)]
pub struct Judge {
    name: String,
    mode: JudgeMode,
    generator: Arc<dyn TextGenerator>,
}

impl fmt::Debug for Judge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Judge")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("model", &self.generator.model())
            .finish()
    }
}

impl Judge {
    pub fn new(name: impl Into<String>, mode: JudgeMode, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            name: name.into(),
            mode,
            generator,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> JudgeMode {
        self.mode
    }

    /// Rates one letter. Returns 0 when the reply holds no integer in [1, 100].
    pub async fn score(&self, text: &str) -> Result<u32, LlmError> {
        let reply = self
            .generator
            .generate(&rate_prompt(text), JUDGE_TEMPERATURE)
            .await?;
        let score = extract_score(&reply);
        debug!(judge = %self.name, score, "score parsed");
        Ok(score)
    }

    /// Asks which letter is better. Returns the reply's first line verbatim.
    pub async fn compare_two(&self, text_a: &str, text_b: &str) -> Result<String, LlmError> {
        let reply = self
            .generator
            .generate(&compare_prompt(text_a, text_b), JUDGE_TEMPERATURE)
            .await?;
        Ok(first_line(&reply))
    }

    /// Asks for both scores and the winner in one labeled reply.
    pub async fn compare_two_with_scores(
        &self,
        text_a: &str,
        text_b: &str,
    ) -> Result<ScoredComparison, LlmError> {
        let reply = self
            .generator
            .generate(&compare_with_scores_prompt(text_a, text_b), JUDGE_TEMPERATURE)
            .await?;

        let score = |label: &str| {
            extract_labeled(label, &reply)
                .filter(|s| *s <= 100)
                .map(|s| s as u32)
        };

        Ok(ScoredComparison {
            score_a: score(CV_1_SCORE_LABEL),
            score_b: score(CV_2_SCORE_LABEL),
            winner: extract_labeled(WINNER_LABEL, &reply).map(|w| w.to_string()),
        })
    }
}

/// Builds one HTTP-backed judge per descriptor. Fails before any work if a key is missing
/// or two judges share a column name.
pub fn build_judges(config: &Config, specs: &[JudgeSpec]) -> Result<Vec<Judge>, AppError> {
    if specs.is_empty() {
        return Err(AppError::Config("at least one judge is required".to_string()));
    }

    let mut judges: Vec<Judge> = Vec::with_capacity(specs.len());
    for spec in specs {
        if judges.iter().any(|j| j.name() == spec.name) {
            return Err(AppError::Config(format!(
                "judge name '{}' is configured twice",
                spec.name
            )));
        }
        let credentials = config.credentials_for(spec.provider)?;
        let client = LlmClient::new(spec.provider, spec.model.clone(), credentials).map_err(|e| {
            AppError::Service {
                judge: spec.name.clone(),
                source: e,
            }
        })?;
        judges.push(Judge::new(spec.name.clone(), spec.mode, Arc::new(client)));
    }
    Ok(judges)
}
