use crate::config::{AppConfig, TerminationPolicy};
use crate::engines::evaluation::{GeneStrategy, Robot, Strategy, TradingDesk};
use crate::engines::generation::{
    gene::Gene,
    history::{BestRobotSnapshot, FinalResults, GenerationRecord, HistoryWriter, RobotSummary},
    operators::breed,
    progress::{NoProgress, ProgressCallback},
    selection::select_parents,
};
use crate::engines::metrics::FitnessEvaluator;
use crate::error::Result;
use crate::logging::Logger;
use crate::market::{LotSizes, MarketClient};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Lifecycle of the controller; the middle three repeat once per generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Initialized,
    RunningGeneration,
    Evaluating,
    Reproducing,
    Terminated,
}

pub struct EvolutionEngine {
    config: AppConfig,
    client: Arc<dyn MarketClient>,
    strategy: Box<dyn Strategy>,
    evaluator: FitnessEvaluator,
    lots: LotSizes,
    population: Vec<Robot>,
    generation: usize,
    next_robot_id: u64,
    state: EngineState,
    history: Vec<GenerationRecord>,
    best_robots: Vec<RobotSummary>,
    history_writer: Option<HistoryWriter>,
    rng: StdRng,
    logger: Logger,
    robot_logger: Logger,
    selection_logger: Logger,
    evaluation_logger: Logger,
}

impl EvolutionEngine {
    /// Validates the whole configuration before anything is simulated
    pub fn new(
        config: AppConfig,
        client: Arc<dyn MarketClient>,
        strategy: Box<dyn Strategy>,
        logger: Logger,
    ) -> Result<Self> {
        config.validate()?;
        let evaluator = FitnessEvaluator::new(
            config.fitness.fitness_weights()?,
            config.fitness.annualization_factor,
        );

        let rng = match config.evolution.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let history_writer = match &config.evolution.history_dir {
            Some(dir) => Some(HistoryWriter::new(dir)?),
            None => None,
        };

        Ok(Self {
            lots: config.trading.lot_sizes(),
            client,
            strategy,
            evaluator,
            population: Vec::new(),
            generation: 0,
            next_robot_id: 1,
            state: EngineState::Initialized,
            history: Vec::new(),
            best_robots: Vec::new(),
            history_writer,
            rng,
            robot_logger: logger.scoped("robot"),
            selection_logger: logger.scoped("selection"),
            evaluation_logger: logger.scoped("evaluation"),
            logger: logger.scoped("controller"),
            config,
        })
    }

    /// Engine trading with the decision-tree strategy and the configured lot sizes
    pub fn with_gene_strategy(
        config: AppConfig,
        client: Arc<dyn MarketClient>,
        logger: Logger,
    ) -> Result<Self> {
        let strategy = GeneStrategy::new(config.trading.lot_sizes());
        Self::new(config, client, Box::new(strategy), logger)
    }

    pub fn create_initial_population(&mut self, size: usize) {
        let mut population = Vec::with_capacity(size);
        for _ in 0..size {
            let gene = Gene::random(&mut self.rng);
            population.push(self.new_robot(0, gene));
        }
        self.population = population;
        self.logger
            .info(format_args!("Created initial population of {} robots", size));
    }

    fn new_robot(&mut self, generation_born: usize, gene: Gene) -> Robot {
        let id = self.next_robot_id;
        self.next_robot_id += 1;
        Robot::new(
            id,
            generation_born,
            self.config.trading.initial_balance,
            gene,
            self.robot_logger.clone(),
        )
    }

    pub fn run_generation(&mut self) -> Result<GenerationRecord> {
        self.run_generation_with(&mut NoProgress)
    }

    fn run_generation_with(&mut self, callback: &mut dyn ProgressCallback) -> Result<GenerationRecord> {
        if self.population.is_empty() {
            self.create_initial_population(self.config.evolution.population_size);
        }

        let start_time = Utc::now();
        self.state = EngineState::RunningGeneration;
        self.trading_pass();
        self.liquidate_all();

        self.state = EngineState::Evaluating;
        let failed_evaluations = self.evaluate_population_with(callback);
        self.sort_population();

        let population_size = self.population.len();
        let (best_robot, avg_profit, avg_fitness) = self.population_summary();
        if let Some(best) = self.population.first() {
            self.best_robots.push(RobotSummary::from(best));
        }

        self.state = EngineState::Reproducing;
        let selection_fallback = self.reproduce();

        let record = GenerationRecord {
            generation: self.generation,
            start_time,
            end_time: Utc::now(),
            best_robot,
            avg_profit,
            avg_fitness,
            population_size,
            failed_evaluations,
            selection_fallback,
        };
        self.history.push(record.clone());
        self.generation += 1;

        // a lost history file does not undo a generation that already ran
        if let Some(writer) = &self.history_writer {
            if let Err(e) = writer.write_generation(&record) {
                self.logger.error(format_args!(
                    "Generation {} history could not be written: {}",
                    record.generation, e
                ));
            }
        }

        Ok(record)
    }

    /// One snapshot per step, applied to every robot in list order
    fn trading_pass(&mut self) {
        let symbol = self.config.trading.symbol.as_str();
        let steps = self.config.trading.generation_duration_steps;
        let interval = self.config.trading.step_interval();
        let desk = TradingDesk {
            client: self.client.as_ref(),
            strategy: self.strategy.as_ref(),
            lots: &self.lots,
            order_timeout: self.config.trading.order_timeout(),
        };

        for step in 0..steps {
            let snapshot = match self.client.get_market_snapshot() {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    self.logger.warn(format_args!(
                        "Generation {} step {}: market snapshot unavailable, skipping step: {}",
                        self.generation, step, e
                    ));
                    continue;
                }
            };

            let mut fills = 0;
            for robot in self.population.iter_mut() {
                fills += robot.trade(symbol, &snapshot, &desk) as usize;
                robot.update_profit(symbol, &snapshot);
            }
            self.logger.debug(format_args!(
                "Generation {} step {}: price {:.2}, {} fills",
                self.generation, step, snapshot.current_price, fills
            ));

            if !interval.is_zero() && step + 1 < steps {
                std::thread::sleep(interval);
            }
        }
    }

    fn liquidate_all(&mut self) {
        let client = self.client.as_ref();
        let closed: usize = self
            .population
            .iter_mut()
            .map(|robot| robot.close_all_positions(client))
            .sum();
        if closed > 0 {
            self.logger
                .debug(format_args!("Force-closed {} positions", closed));
        }
    }

    /// Scores every robot in parallel; returns how many evaluations failed.
    ///
    /// A failed robot ranks last with fitness `-inf`.
    pub fn evaluate_population(&mut self) -> usize {
        self.evaluate_population_with(&mut NoProgress)
    }

    fn evaluate_population_with(&mut self, callback: &mut dyn ProgressCallback) -> usize {
        let evaluator = &self.evaluator;
        let logger = &self.evaluation_logger;
        let total = self.population.len();
        let progress = Mutex::new((0usize, callback));

        self.population
            .par_iter_mut()
            .map(|robot| {
                let outcome = evaluator.evaluate(&robot.history());
                let failed: usize = match outcome {
                    Ok(report) => {
                        robot.apply_report(report);
                        0
                    }
                    Err(e) => {
                        logger.warn(format_args!("Robot {} could not be evaluated: {}", robot.id, e));
                        robot.fitness = f64::NEG_INFINITY;
                        robot.last_report = None;
                        1
                    }
                };

                if let Ok(mut guard) = progress.lock() {
                    let (evaluated, callback) = &mut *guard;
                    *evaluated += 1;
                    callback.on_robot_evaluated(*evaluated, total);
                }
                failed
            })
            .sum()
    }

    /// Descending by fitness; stable for ties
    fn sort_population(&mut self) {
        for robot in self.population.iter_mut() {
            if robot.fitness.is_nan() {
                robot.fitness = f64::NEG_INFINITY;
            }
        }
        self.population
            .sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
    }

    fn population_summary(&self) -> (BestRobotSnapshot, f64, f64) {
        let best = self
            .population
            .first()
            .map(|r| BestRobotSnapshot {
                id: r.id,
                profit: r.current_profit,
                fitness: r.fitness,
            })
            .unwrap_or(BestRobotSnapshot {
                id: 0,
                profit: 0.0,
                fitness: 0.0,
            });

        let avg_profit = finite_mean(self.population.iter().map(|r| r.current_profit));
        let avg_fitness = finite_mean(self.population.iter().map(|r| r.fitness));
        (best, avg_profit, avg_fitness)
    }

    /// Keeps the elites and refills the population with children.
    ///
    /// Returns whether selection fell back to uniform sampling.
    fn reproduce(&mut self) -> bool {
        let fitness: Vec<f64> = self.population.iter().map(|r| r.fitness).collect();
        let selection = select_parents(
            &fitness,
            self.config.evolution.elite_size,
            &mut self.rng,
            &self.selection_logger,
        );
        let pool: Vec<usize> = selection
            .parents()
            .into_iter()
            .take(self.config.evolution.parent_pool_size)
            .collect();

        let elite_count = selection.elites.len();
        let target = self.config.evolution.population_size;
        let mut children = Vec::with_capacity(target.saturating_sub(elite_count));
        while elite_count + children.len() < target {
            let child = if pool.is_empty() {
                let gene = Gene::random(&mut self.rng);
                self.new_robot(self.generation + 1, gene)
            } else {
                let (a, b) = self.pick_parents(&pool);
                self.create_child(a, b)
            };
            children.push(child);
        }

        self.population.truncate(elite_count);
        for elite in self.population.iter_mut() {
            elite.survived_cycles += 1;
        }
        self.population.extend(children);

        selection.used_uniform_fallback
    }

    /// Two distinct pool members, or the only one twice
    fn pick_parents(&mut self, pool: &[usize]) -> (usize, usize) {
        if pool.len() < 2 {
            return (pool[0], pool[0]);
        }
        let picked = rand::seq::index::sample(&mut self.rng, pool.len(), 2);
        (pool[picked.index(0)], pool[picked.index(1)])
    }

    /// New identity with a fresh balance and a bred gene
    pub fn create_child(&mut self, parent_a: usize, parent_b: usize) -> Robot {
        let gene = breed(
            &self.population[parent_a].gene,
            &self.population[parent_b].gene,
            &mut self.rng,
        );
        let survived_cycles = self.population[parent_a]
            .survived_cycles
            .max(self.population[parent_b].survived_cycles)
            - 1;

        self.population[parent_a].children_count += 1;
        if parent_b != parent_a {
            self.population[parent_b].children_count += 1;
        }

        let mut child = self.new_robot(self.generation + 1, gene);
        child.survived_cycles = survived_cycles;
        child
    }

    pub fn should_continue(&self) -> bool {
        if self.state == EngineState::Terminated
            || self.generation >= self.config.evolution.max_generations
        {
            return false;
        }

        let Some(last) = self.history.last() else {
            return true;
        };
        match self.config.evolution.termination {
            TerminationPolicy::GenerationCap => true,
            TerminationPolicy::ProfitTarget { ratio } => {
                last.best_robot.profit < ratio * self.config.trading.initial_balance
            }
            TerminationPolicy::FitnessTarget { threshold } => last.best_robot.fitness <= threshold,
        }
    }

    /// Runs generations until the termination policy stops the loop
    pub fn run<C: ProgressCallback>(&mut self, mut callback: C) -> Result<FinalResults> {
        let started = Instant::now();
        if self.population.is_empty() {
            self.create_initial_population(self.config.evolution.population_size);
        }

        while self.should_continue() {
            callback.on_generation_start(self.generation);
            let record = self.run_generation_with(&mut callback)?;
            callback.on_generation_complete(&record);
        }
        self.state = EngineState::Terminated;

        let results = FinalResults::from_history(
            &self.history,
            &self.best_robots,
            self.population.len(),
            started.elapsed().as_secs_f64(),
        );
        if let Some(writer) = &self.history_writer {
            let path = writer.write_final(&results)?;
            self.logger
                .info(format_args!("Final results written to {}", path.display()));
        }

        self.logger.info(format_args!(
            "Evolution finished after {} generations: best fitness {:.4}, best profit {:.2}",
            results.total_generations, results.best_fitness, results.best_profit
        ));
        Ok(results)
    }

    pub fn population(&self) -> &[Robot] {
        &self.population
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn history(&self) -> &[GenerationRecord] {
        &self.history
    }

    pub fn best_robots(&self) -> &[RobotSummary] {
        &self.best_robots
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Mean of the finite values, 0 when there are none
fn finite_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
