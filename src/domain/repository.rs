use async_trait::async_trait;

use super::model::book::{Book, NewBook};
use super::model::id::BookId;

/// リモート `/books` APIの抽象。Infra層が実装する。
#[async_trait]
pub trait BookRepository: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn list(&self) -> Result<Vec<Book>, Self::Error>;
    async fn create(&self, book: &NewBook) -> Result<Book, Self::Error>;
    async fn update(&self, book: &Book) -> Result<Book, Self::Error>;
    async fn delete(&self, id: &BookId) -> Result<(), Self::Error>;
}
