mod cli;
mod ui;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Command};
use hirepath::api::{HiringClient, InMemoryRecruitingApi, RecruitingApi, StaticToken};
use hirepath::config::HiringConfig;
use hirepath::pipeline::{
    BatchEvaluator, CandidateId, EvaluationSummary, FetchOptions, JobOpeningId, PipelineSettings,
    RoundProgressionController, RoundStatus, RoundTemplateId,
};
use hirepath::telemetry;
use ui::StepProgress;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => HiringConfig::load_from(path)?,
        None => HiringConfig::load()?,
    };
    if let Some(url) = cli.api_url.clone() {
        config.api_url = url;
    }
    let level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    telemetry::init(level)?;

    if let Command::Demo = cli.command {
        return run_demo(&config).await;
    }

    let client = HiringClient::new(config.api_url.clone(), StaticToken::new(config.api_token.clone()))?;
    execute(Arc::new(client), cli.command, &config).await
}

/// Cancel the token on Ctrl-C so long page fetches stop early.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let guard = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            guard.cancel();
        }
    });
    token
}

async fn execute<A: RecruitingApi>(api: Arc<A>, command: Command, config: &HiringConfig) -> Result<()> {
    let mut controller = RoundProgressionController::new(api.clone(), config.pipeline_settings());

    match command {
        Command::Rounds { job, refresh } => {
            let job = JobOpeningId(job);
            controller.list_rounds(&job, refresh).await?;
            ui::print_rounds(&controller.registry().rounds_of(&job));
        }
        Command::Candidates {
            job,
            template,
            refresh,
        } => {
            controller.list_rounds(&JobOpeningId(job), false).await?;
            let options = FetchOptions {
                force_refresh: refresh,
                include_evaluations: true,
                cancel: Some(cancel_on_ctrl_c()),
                ..FetchOptions::default()
            };
            let records = controller
                .load_round(&RoundTemplateId(template), &options)
                .await?;
            ui::print_candidates(&records);
        }
        Command::Confirm { job, template } => {
            controller.list_rounds(&JobOpeningId(job), false).await?;
            let confirmed = controller.confirm_round(&RoundTemplateId(template)).await?;
            println!("  confirmed {} ({})", confirmed.name, confirmed.id);
        }
        Command::SetStatus {
            job,
            template,
            status,
            candidates,
        } => {
            let template = RoundTemplateId(template);
            controller.list_rounds(&JobOpeningId(job), false).await?;
            controller
                .load_round(&template, &FetchOptions::refresh())
                .await?;
            let ids: Vec<CandidateId> = candidates.into_iter().map(CandidateId).collect();
            let report = controller.bulk_set_status(&template, status, &ids).await?;
            ui::print_commit(&report);
        }
        Command::Progress { job, template } => {
            let template = RoundTemplateId(template);
            let progress = StepProgress::start("loading rounds");
            controller.list_rounds(&JobOpeningId(job), true).await?;
            progress.step(&format!("progressing {template}"));
            match controller.progress_to_next_round(&template).await {
                Ok(report) => {
                    progress.finish(Ok("round progression complete"));
                    ui::print_progression(&report);
                }
                Err(err) => {
                    if err.is_retryable() {
                        progress.warn("completed steps were kept; re-run progress to finish");
                    }
                    progress.finish(Err("round progression failed"));
                    return Err(err.into());
                }
            }
        }
        Command::Evaluate { job, template } => {
            let template = RoundTemplateId(template);
            controller.list_rounds(&JobOpeningId(job), false).await?;
            let records = controller
                .load_round(&template, &FetchOptions::refresh())
                .await?;
            let ids: Vec<CandidateId> = records.iter().map(|r| r.candidate_id.clone()).collect();

            let progress = StepProgress::start(&format!("evaluating {} candidates", ids.len()));
            let evaluator = BatchEvaluator::new(api.as_ref(), config.evaluation_delay());
            let outcomes = evaluator.evaluate_all(&template, &ids).await;
            progress.finish(Ok("evaluation finished"));

            for outcome in outcomes {
                match outcome.result {
                    Ok(summary) => ui::print_evaluation(outcome.candidate_id.as_str(), summary.overall()),
                    Err(err) => println!("  {:<24} failed: {err}", outcome.candidate_id),
                }
            }
        }
        Command::Demo => return run_demo(config).await,
    }
    Ok(())
}

/// Walk the carry-forward scenario against the in-memory backend.
async fn run_demo(config: &HiringConfig) -> Result<()> {
    let api = Arc::new(InMemoryRecruitingApi::new());
    let job = JobOpeningId::from("demo-job");
    let rounds = api.seed_job(
        &job,
        &["Resume Screening", "Technical Interview", "Culture Fit", "Offer Rollout"],
    );
    let first = rounds[0].id.clone();
    let people = [
        ("cand-a", "Ada Lovelace", 86.0),
        ("cand-b", "Brian Kernighan", 52.5),
        ("cand-c", "Chen Wei", 67.0),
    ];
    for (id, name, score) in people {
        let id = CandidateId::from(id);
        api.seed_candidate(&first, &id, name, RoundStatus::ActionPending);
        api.seed_evaluation(
            &id,
            EvaluationSummary {
                overall_score: Some(score),
                round_scores: BTreeMap::from([(1, score)]),
                recommendation: None,
            },
        );
    }

    let settings = PipelineSettings {
        created_by: "demo".to_string(),
        ..config.pipeline_settings()
    };
    let mut controller = RoundProgressionController::new(api.clone(), settings);
    controller.list_rounds(&job, false).await?;
    println!("Rounds:");
    ui::print_rounds(&controller.registry().rounds_of(&job));

    controller.load_round(&first, &FetchOptions::default()).await?;
    controller.stage(&CandidateId::from("cand-a"), &first, RoundStatus::Selected)?;
    controller.stage(&CandidateId::from("cand-b"), &first, RoundStatus::Rejected)?;
    println!("\nCommitting staged changes in {}:", rounds[0].name);
    let report = controller.commit(&first).await?;
    ui::print_commit(&report);

    println!("\nProgressing:");
    let progression = controller.progress_to_next_round(&first).await?;
    ui::print_progression(&progression);

    println!("\n{}:", progression.to.name);
    let records = controller
        .load_round(&progression.to.id, &FetchOptions::refresh().with_evaluations())
        .await?;
    ui::print_candidates(&records);

    println!("\nRounds:");
    ui::print_rounds(&controller.registry().rounds_of(&job));
    Ok(())
}
