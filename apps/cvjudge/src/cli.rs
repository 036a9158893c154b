//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::judge::JudgeSpec;
use crate::pipeline::{CheckpointPolicy, PairingStrategy};

const DEFAULT_BODY_COLUMN: &str = "Generated_Cover_Letter";

/// cvjudge - resumable LLM judging of synthetic cover letters
#[derive(Parser, Debug)]
#[command(
    name = "cvjudge",
    version,
    about = "Score and pairwise-compare synthetic cover letters with LLM judges",
    after_help = "API keys and endpoints are read from the environment (or a .env file)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score and compare every record, checkpointing to the progress file
    Judge(JudgeArgs),

    /// Fill the cover-letter column of a people file
    Generate(GenerateArgs),
}

/// When the progress file is rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CheckpointMode {
    /// After every record
    #[default]
    Record,
    /// After every --batch-size records
    Batch,
}

#[derive(Args, Debug)]
pub struct JudgeArgs {
    /// Base CSV with one synthetic person per row
    #[arg(short, long)]
    pub input: PathBuf,

    /// Checkpoint CSV; loaded instead of --input when it exists
    #[arg(short, long)]
    pub progress: PathBuf,

    /// Final CSV written after the run
    #[arg(short, long)]
    pub output: PathBuf,

    /// Judge as [name=]provider:model[:separate|combined]; repeat for several judges
    #[arg(short, long = "judge", value_name = "SPEC", required = true)]
    pub judges: Vec<JudgeSpec>,

    #[arg(long, value_enum, default_value_t = PairingStrategy::Sequential)]
    pub pairing: PairingStrategy,

    #[arg(long, value_enum, default_value_t = CheckpointMode::Record)]
    pub checkpoint: CheckpointMode,

    /// Records per cooldown window (and per checkpoint in batch mode)
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: u64,

    /// Pause after every batch, in seconds
    #[arg(long, default_value_t = 60)]
    pub cooldown_secs: u64,

    /// Row to start from when no unfinished row is found
    #[arg(long, default_value_t = 0)]
    pub start_row: usize,

    /// Seed for random pairing
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value = DEFAULT_BODY_COLUMN)]
    pub body_column: String,
}

impl JudgeArgs {
    pub fn checkpoint_policy(&self) -> CheckpointPolicy {
        match self.checkpoint {
            CheckpointMode::Record => CheckpointPolicy::PerRecord,
            CheckpointMode::Batch => CheckpointPolicy::PerBatch(self.batch_size as usize),
        }
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// CSV of synthetic people
    #[arg(short, long)]
    pub input: PathBuf,

    /// CSV with the generated column; resumed from when it exists
    #[arg(short, long)]
    pub output: PathBuf,

    /// Generator as provider:model
    #[arg(short, long, value_name = "PROVIDER:MODEL")]
    pub model: JudgeSpec,

    #[arg(long, default_value = DEFAULT_BODY_COLUMN)]
    pub body_column: String,

    #[arg(long, default_value_t = 0.51)]
    pub min_temperature: f32,

    #[arg(long, default_value_t = 0.71)]
    pub max_temperature: f32,

    /// Seed for temperature sampling
    #[arg(long)]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::JudgeMode;
    use crate::llm_client::Provider;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_judge_defaults() {
        let cli = Cli::try_parse_from([
            "cvjudge", "judge", "-i", "people.csv", "-p", "progress.csv", "-o", "final.csv",
            "--judge", "gemini:gemini-1.5-flash",
        ])
        .unwrap();
        let Command::Judge(args) = cli.command else {
            panic!("expected judge subcommand");
        };
        assert_eq!(args.pairing, PairingStrategy::Sequential);
        assert_eq!(args.checkpoint_policy(), CheckpointPolicy::PerRecord);
        assert_eq!(args.batch_size, 5);
        assert_eq!(args.cooldown_secs, 60);
        assert_eq!(args.body_column, "Generated_Cover_Letter");
        assert_eq!(args.judges[0].provider, Provider::Gemini);
    }

    #[test]
    fn test_judge_accepts_several_judges_and_batch_mode() {
        let cli = Cli::try_parse_from([
            "cvjudge", "judge", "-i", "a.csv", "-p", "b.csv", "-o", "c.csv",
            "--judge", "openai:gpt-4o-mini",
            "--judge", "llama=local:Meta-Llama-3-8B:combined",
            "--pairing", "random", "--checkpoint", "batch", "--batch-size", "8",
        ])
        .unwrap();
        let Command::Judge(args) = cli.command else {
            panic!("expected judge subcommand");
        };
        assert_eq!(args.judges.len(), 2);
        assert_eq!(args.judges[1].mode, JudgeMode::Combined);
        assert_eq!(args.pairing, PairingStrategy::Random);
        assert_eq!(args.checkpoint_policy(), CheckpointPolicy::PerBatch(8));
    }

    #[test]
    fn test_judge_rejects_zero_batch_and_missing_judge() {
        let base = ["cvjudge", "judge", "-i", "a.csv", "-p", "b.csv", "-o", "c.csv"];
        assert!(Cli::try_parse_from(base).is_err());

        let mut zero = base.to_vec();
        zero.extend(["--judge", "local:x", "--batch-size", "0"]);
        assert!(Cli::try_parse_from(zero).is_err());

        let mut bad = base.to_vec();
        bad.extend(["--judge", "cohere:command"]);
        assert!(Cli::try_parse_from(bad).is_err());
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::try_parse_from([
            "cvjudge", "generate", "-i", "people.csv", "-o", "people_cv.csv", "-m", "openai:gpt-4o",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate subcommand");
        };
        assert_eq!(args.model.model, "gpt-4o");
        assert_eq!(args.min_temperature, 0.51);
        assert_eq!(args.max_temperature, 0.71);
    }
}
