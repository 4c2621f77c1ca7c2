use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use miette::{IntoDiagnostic, WrapErr};

use lorewright::config::AppConfig;
use lorewright::core::campaign::{ActiveCampaign, Campaign};
use lorewright::core::generation::{
    builtin_blocks, find_block, BlockOrchestrator, ExecutorConfig, FlowExecutor, FlowRegistry,
    GenerateOutcome, OptionValue, TriggerOutcome,
};
use lorewright::core::library::JsonlLibrary;
use lorewright::core::llm::GoogleProvider;
use lorewright::core::logging::{self, AppError};

mod cli;

use cli::{BlockArgs, Cli, Command};

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let _log_guard = logging::init(&config.logging, &config.log_dir());
    log::info!("{} v{} starting", lorewright::NAME, lorewright::VERSION);

    match cli.command {
        Command::Blocks => {
            list_blocks();
            Ok(())
        }
        Command::Prompt(args) => {
            let block = build_orchestrator(&config, &args).await?;
            let prompt = block.preview_prompt().await.map_err(AppError::from)?;
            logging::print_panel(block.block().title, &prompt);
            Ok(())
        }
        Command::Generate { args, save, expand } => generate(&config, &args, save, &expand).await,
    }
}

fn list_blocks() {
    for block in builtin_blocks() {
        let options: Vec<&str> = block.options.iter().map(|o| o.id.as_str()).collect();
        if options.is_empty() {
            println!("{:<20} {}", block.id, block.description);
        } else {
            println!("{:<20} {} [{}]", block.id, block.description, options.join(", "));
        }
    }
}

async fn build_orchestrator(config: &AppConfig, args: &BlockArgs) -> miette::Result<BlockOrchestrator> {
    let definition = find_block(&args.block).ok_or_else(|| {
        AppError::new(format!("Unknown block: {}", args.block))
            .with_help("Run `lorewright blocks` to list the available blocks")
    })?;

    let provider = GoogleProvider::from_config(&config.provider);
    let executor = FlowExecutor::new(FlowRegistry::builtin(), Arc::new(provider))
        .with_config(ExecutorConfig::from(&config.generation));

    let campaigns = match &args.campaign {
        Some(path) => ActiveCampaign::with_active(load_campaign(path)?),
        None => ActiveCampaign::new(),
    };
    let library = JsonlLibrary::new(config.library_path());

    let block = BlockOrchestrator::new(
        definition.clone(),
        Arc::new(executor),
        Arc::new(campaigns),
        Arc::new(library),
    );

    for (id, value) in &args.options {
        block
            .update_option(id, OptionValue::fixed(value.clone()))
            .await
            .into_diagnostic()?;
    }
    for (id, text) in &args.custom {
        block
            .update_option(id, OptionValue::custom(text.clone()))
            .await
            .into_diagnostic()?;
    }
    block.update_refinement(args.refine.clone()).await;
    block
        .update_campaign_context_toggle(!args.no_campaign_context)
        .await;

    Ok(block)
}

fn load_campaign(path: &Path) -> miette::Result<Campaign> {
    let raw = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read campaign file {}", path.display()))?;
    serde_json::from_str(&raw)
        .into_diagnostic()
        .wrap_err("Campaign file is not valid campaign JSON")
}

async fn generate(config: &AppConfig, args: &BlockArgs, save: bool, expand: &[String]) -> miette::Result<()> {
    let block = build_orchestrator(config, args).await?;

    let result = match block.generate().await {
        GenerateOutcome::Ready(result) => result,
        GenerateOutcome::Failed(err) => {
            logging::print_error(&err.user_message());
            return Err(AppError::from(err).into());
        }
        GenerateOutcome::Ignored | GenerateOutcome::Discarded => {
            logging::print_warning("Generation did not complete");
            return Ok(());
        }
    };

    if expand.is_empty() {
        println!("{}", result.html());
    } else {
        match block.interactive().await.map_err(AppError::from)? {
            Some(live) => {
                for key in expand {
                    match live.trigger(key).await {
                        Ok(TriggerOutcome::Patched(placement)) => {
                            log::debug!("Expanded {:?} ({:?})", key, placement)
                        }
                        Ok(TriggerOutcome::Ignored) => {}
                        Err(err) => logging::print_warning(&err.user_message()),
                    }
                }
                println!("{}", live.html().await);
            }
            None => {
                logging::print_warning("This block has no expandable entries");
                println!("{}", result.html());
            }
        }
    }

    if save {
        match block.save().await {
            Ok(outcome) => logging::print_success(&outcome.message()),
            Err(err) => {
                logging::print_error(&err.user_message());
                return Err(AppError::from(err).into());
            }
        }
    }

    Ok(())
}
