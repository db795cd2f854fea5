pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("model JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid tree model: {message}")]
    InvalidModel { message: String },

    #[error("invalid clustering result: {message}")]
    InvalidClustering { message: String },

    #[error("invalid render config: {message}")]
    InvalidConfig { message: String },
}
