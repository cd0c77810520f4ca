#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("remote API error: {0}")]
    Remote(#[source] Box<dyn std::error::Error + Send + Sync>),
}
