use thiserror::Error;

use finsent_core::BatchError;
use finsent_model::ModelError;
use finsent_store::StoreError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("batch decode error: {0}")]
    Batch(#[from] BatchError),

    #[error("object storage error: {0}")]
    ObjectStore(#[from] std::io::Error),
}
