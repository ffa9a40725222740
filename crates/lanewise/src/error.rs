pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid layout options: {message}")]
    InvalidOptions { message: String },

    /// The layered layout step failed for one region. Nothing from the call is applied.
    #[error("layout solver failed for region `{region}`: {message}")]
    Solver { region: String, message: String },

    #[error("element `{id}` is placed inside unknown container `{parent}`")]
    UnknownContainer { id: String, parent: String },

    #[error("containment chain for `{id}` is deeper than {max_depth} levels")]
    ContainmentDepth { id: String, max_depth: usize },

    #[error("graph JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
