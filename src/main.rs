use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tradevolve::engines::generation::LogProgressCallback;
use tradevolve::{ConfigManager, EvolutionEngine, Logger, PaperExchange};

#[derive(Parser, Debug)]
#[command(author, version, about = "Evolve rule-based trading robots against a paper exchange")]
struct Args {
    /// TOML configuration; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    generations: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    history_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let manager = ConfigManager::new();
    if let Some(path) = &args.config {
        manager
            .load_from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
    }
    manager
        .update(|config| {
            if let Some(generations) = args.generations {
                config.evolution.max_generations = generations;
            }
            if let Some(seed) = args.seed {
                config.evolution.seed = Some(seed);
            }
            if let Some(dir) = &args.history_dir {
                config.evolution.history_dir = Some(dir.clone());
            }
        })
        .context("invalid command line overrides")?;
    let config = manager.get();

    let logger = Logger::to_log("tradevolve");
    logger.info(format_args!(
        "Evolving {} robots on {} for up to {} generations",
        config.evolution.population_size, config.trading.symbol, config.evolution.max_generations
    ));

    let exchange = Arc::new(PaperExchange::new(config.paper.clone()));
    let mut engine = EvolutionEngine::with_gene_strategy(config, exchange, logger.clone())
        .context("failed to build evolution engine")?;
    let results = engine.run(LogProgressCallback::new(logger.scoped("progress")))?;

    logger.info(format_args!(
        "Done: {} generations in {:.2}s, best fitness {:.4}, best profit {:.2}, final population {}",
        results.total_generations,
        results.execution_time_secs,
        results.best_fitness,
        results.best_profit,
        results.final_population_size
    ));
    if let Some(best) = engine.population().first() {
        logger.info(format_args!(
            "Top robot {} (born generation {}, survived {} cycles): {:?}",
            best.id, best.generation_born, best.survived_cycles, best.gene
        ));
    }

    Ok(())
}
