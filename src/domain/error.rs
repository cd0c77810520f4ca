#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("book id must not be empty")]
    EmptyBookId,
}
