use crate::engines::evaluation::Robot;
use crate::engines::generation::gene::Gene;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestRobotSnapshot {
    pub id: u64,
    pub profit: f64,
    pub fitness: f64,
}

/// Summary of one completed generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub best_robot: BestRobotSnapshot,
    pub avg_profit: f64,
    pub avg_fitness: f64,
    pub population_size: usize,
    pub failed_evaluations: usize,
    pub selection_fallback: bool,
}

/// Best robot of a generation, gene included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotSummary {
    pub id: u64,
    pub generation_born: usize,
    pub survived_cycles: i64,
    pub children_count: u32,
    pub profit: f64,
    pub fitness: f64,
    pub trades: usize,
    pub gene: Gene,
}

impl From<&Robot> for RobotSummary {
    fn from(robot: &Robot) -> Self {
        Self {
            id: robot.id,
            generation_born: robot.generation_born,
            survived_cycles: robot.survived_cycles,
            children_count: robot.children_count,
            profit: robot.current_profit,
            fitness: robot.fitness,
            trades: robot.trades().len(),
            gene: robot.gene.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResults {
    pub total_generations: usize,
    pub best_fitness: f64,
    pub best_profit: f64,
    pub final_population_size: usize,
    pub execution_time_secs: f64,
    pub best_robots: Vec<RobotSummary>,
}

impl FinalResults {
    /// Best values are taken over every recorded generation, 0 when none ran
    pub fn from_history(
        history: &[GenerationRecord],
        best_robots: &[RobotSummary],
        final_population_size: usize,
        execution_time_secs: f64,
    ) -> Self {
        let best = |f: fn(&BestRobotSnapshot) -> f64| {
            history
                .iter()
                .map(|r| f(&r.best_robot))
                .filter(|v| v.is_finite())
                .reduce(f64::max)
                .unwrap_or(0.0)
        };

        Self {
            total_generations: history.len(),
            best_fitness: best(|b| b.fitness),
            best_profit: best(|b| b.profit),
            final_population_size,
            execution_time_secs,
            best_robots: best_robots.to_vec(),
        }
    }
}

/// Writes generation records and final results as pretty JSON files
#[derive(Debug, Clone)]
pub struct HistoryWriter {
    dir: PathBuf,
}

impl HistoryWriter {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn generation_path(&self, generation: usize) -> PathBuf {
        self.dir.join(format!("generation_{}.json", generation))
    }

    pub fn final_results_path(&self) -> PathBuf {
        self.dir.join("final_results.json")
    }

    pub fn write_generation(&self, record: &GenerationRecord) -> Result<PathBuf> {
        let path = self.generation_path(record.generation);
        Self::write_json(&path, record)?;
        Ok(path)
    }

    pub fn write_final(&self, results: &FinalResults) -> Result<PathBuf> {
        let path = self.final_results_path();
        Self::write_json(&path, results)?;
        Ok(path)
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, value)?;
        Ok(())
    }
}
