use thiserror::Error;

use finsent_model::ModelError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("positional alignment violated: {values} values for {documents} documents")]
    Alignment { values: usize, documents: usize },
}
