pub mod gene;
pub mod operators;
pub mod selection;
pub mod history;
pub mod progress;
pub mod evolution_engine;

pub use gene::{Comparison, Condition, DecisionTree, Gene, Indicator, Threshold, CONDITION_CATALOG};
pub use operators::{breed, crossover, mutate};
pub use selection::{select_parents, Selection};
pub use history::{BestRobotSnapshot, FinalResults, GenerationRecord, HistoryWriter, RobotSummary};
pub use progress::{
    ChannelProgressCallback, LogProgressCallback, NoProgress, ProgressCallback, ProgressMessage,
};
pub use evolution_engine::{EngineState, EvolutionEngine};
