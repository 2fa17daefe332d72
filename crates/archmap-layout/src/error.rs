pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("layout config JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("layout config override must be a JSON object, got {found}")]
    ConfigNotAnObject { found: &'static str },
    #[error("duplicate node id `{id}`")]
    DuplicateNode { id: String },
    #[error("duplicate edge id `{id}`")]
    DuplicateEdge { id: String },
    #[error("node `{id}` has an invalid size {width}x{height}")]
    InvalidNodeSize { id: String, width: f64, height: f64 },
    #[error("edge `{edge}` references unknown node `{node}`")]
    MissingEndpoint { edge: String, node: String },
    #[error("edge `{edge}` contradicts the layer pinned for node `{node}`")]
    LayerConstraint { edge: String, node: String },
    #[error("layered layout failed: {0}")]
    Layered(#[from] dugong::LayoutError),
}
