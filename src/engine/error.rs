use thiserror::Error;

/// Errors raised by the worker infrastructure (never by the simulation itself)
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to spawn simulation worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Simulation worker panicked")]
    WorkerPanicked,
}
