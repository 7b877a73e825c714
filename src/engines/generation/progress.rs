use crate::engines::generation::history::GenerationRecord;
use crate::logging::Logger;
use std::sync::mpsc::Sender;

pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    fn on_robot_evaluated(&mut self, evaluated: usize, total: usize);
    fn on_generation_complete(&mut self, record: &GenerationRecord);
}

/// Discards every event
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_generation_start(&mut self, _generation: usize) {}
    fn on_robot_evaluated(&mut self, _evaluated: usize, _total: usize) {}
    fn on_generation_complete(&mut self, _record: &GenerationRecord) {}
}

pub struct LogProgressCallback {
    logger: Logger,
}

impl LogProgressCallback {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl ProgressCallback for LogProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        self.logger
            .info(format_args!("Generation {} starting...", generation + 1));
    }

    fn on_robot_evaluated(&mut self, evaluated: usize, total: usize) {
        if evaluated % 10 == 0 || evaluated == total {
            self.logger
                .debug(format_args!("  Evaluated {}/{} robots", evaluated, total));
        }
    }

    fn on_generation_complete(&mut self, record: &GenerationRecord) {
        self.logger.info(format_args!(
            "Generation {} complete. Best robot {}: fitness {:.4}, profit {:.2}; avg fitness {:.4}",
            record.generation + 1,
            record.best_robot.id,
            record.best_robot.fitness,
            record.best_robot.profit,
            record.avg_fitness
        ));
    }
}

// For streaming progress to another thread
pub struct ChannelProgressCallback {
    sender: Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    GenerationStart(usize),
    RobotEvaluated { current: usize, total: usize },
    GenerationComplete(GenerationRecord),
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_robot_evaluated(&mut self, evaluated: usize, total: usize) {
        let _ = self.sender.send(ProgressMessage::RobotEvaluated {
            current: evaluated,
            total,
        });
    }

    fn on_generation_complete(&mut self, record: &GenerationRecord) {
        let _ = self
            .sender
            .send(ProgressMessage::GenerationComplete(record.clone()));
    }
}
