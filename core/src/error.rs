use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllocError {
    #[error("No workers available for task allocation")]
    NoWorkersAvailable,

    #[error("Invalid worker '{worker_id}': {reason}")]
    InvalidWorker { worker_id: String, reason: String },

    #[error("Invalid task '{task_id}': {reason}")]
    InvalidTask { task_id: String, reason: String },

    #[error("Duplicate worker id '{worker_id}' on roster")]
    DuplicateWorker { worker_id: String },

    #[error("Duplicate task id '{task_id}' in task set")]
    DuplicateTask { task_id: String },

    #[error("Worker '{worker_id}' not found")]
    WorkerNotFound { worker_id: String },

    #[error("Stale worker '{worker_id}': expected version {expected}, found {actual}")]
    StaleWorkerVersion {
        worker_id: String,
        expected: u64,
        actual: u64,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AllocResult<T> = Result<T, AllocError>;
