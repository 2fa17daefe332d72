pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown view kind: {kind}")]
    UnknownView { kind: String },
}
