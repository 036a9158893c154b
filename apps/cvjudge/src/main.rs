mod cli;
mod config;
mod errors;
mod generation;
mod judge;
mod llm_client;
mod pipeline;
mod store;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Command, GenerateArgs, JudgeArgs};
use crate::config::Config;
use crate::generation::{CoverLetterStage, GenerationOptions};
use crate::judge::build_judges;
use crate::llm_client::LlmClient;
use crate::pipeline::{
    check_output_path, finalize, write_output, Pipeline, PipelineOptions, RateLimitGovernor,
    TokioWaiter,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first; keys are checked per provider when judges are built
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cvjudge v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Judge(args) => run_judge(&config, args).await,
        Command::Generate(args) => run_generate(&config, args).await,
    }
}

async fn run_judge(config: &Config, args: JudgeArgs) -> Result<()> {
    check_output_path(&args.output, &args.progress)?;

    // Fail on missing keys before touching any file
    let judges = build_judges(config, &args.judges)?;
    for judge in &judges {
        info!("Judge initialized: {:?}", judge);
    }
    let names: Vec<String> = judges.iter().map(|j| j.name().to_string()).collect();

    let table = store::load_or_create(&args.input, &args.progress, &args.body_column, &names)?;

    let governor = RateLimitGovernor::new(
        args.batch_size as usize,
        Duration::from_secs(args.cooldown_secs),
        Arc::new(TokioWaiter),
    );
    let options = PipelineOptions {
        pairing: args.pairing,
        checkpoint: args.checkpoint_policy(),
        start_offset: args.start_row,
        seed: args.seed,
    };

    let mut pipeline = Pipeline::new(table, judges, &args.progress, options, governor);
    let summary = match pipeline.run().await {
        Ok(summary) => summary,
        Err(e) if e.is_service() => {
            return Err(e).context("judging stopped; progress was saved, rerun the same command to resume")
        }
        Err(e) => return Err(e.into()),
    };
    if summary.incomplete > 0 {
        warn!(
            "{} rows got an incomplete combined reply and stay open for the next run",
            summary.incomplete
        );
    }

    let mut table = pipeline.into_table();
    finalize(&mut table)?;
    write_output(&table, &args.output, &args.progress)?;
    Ok(())
}

async fn run_generate(config: &Config, args: GenerateArgs) -> Result<()> {
    let credentials = config.credentials_for(args.model.provider)?;
    let client = LlmClient::new(args.model.provider, args.model.model.clone(), credentials)
        .context("failed to build HTTP client")?;
    info!("Generator initialized: {}:{}", args.model.provider, args.model.model);

    let options = GenerationOptions {
        body_column: args.body_column,
        min_temperature: args.min_temperature,
        max_temperature: args.max_temperature,
        seed: args.seed,
    };
    CoverLetterStage::new(Arc::new(client), options)
        .run(&args.input, &args.output)
        .await
        .context("generation stopped; rerun the same command to resume")?;
    Ok(())
}
