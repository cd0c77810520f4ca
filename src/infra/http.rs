use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::domain::model::book::{Book, NewBook};
use crate::domain::model::id::BookId;
use crate::domain::repository::BookRepository;

use super::config::ClientConfig;

#[derive(Debug, thiserror::Error)]
pub enum HttpRepositoryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// REST APIによるBookRepository実装。
/// `{base_url}/books` と `{base_url}/books/{id}` だけを叩く。
pub struct HttpBookRepository {
    collection: Url,
    client: Client,
}

impl HttpBookRepository {
    pub fn new(config: &ClientConfig) -> Result<Self, HttpRepositoryError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Self::with_client(&config.base_url, builder.build()?)
    }

    pub fn with_client(base_url: &str, client: Client) -> Result<Self, HttpRepositoryError> {
        let mut collection = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| HttpRepositoryError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        collection
            .path_segments_mut()
            .map_err(|_| HttpRepositoryError::InvalidBaseUrl(base_url.to_string()))?
            .pop_if_empty()
            .push("books");
        Ok(Self { collection, client })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection
    }

    /// idは1セグメントとしてパーセントエンコードされる。
    pub fn item_url(&self, id: &BookId) -> Result<Url, HttpRepositoryError> {
        let mut url = self.collection.clone();
        url.path_segments_mut()
            .map_err(|_| HttpRepositoryError::InvalidBaseUrl(self.collection.to_string()))?
            .push(id.as_str());
        Ok(url)
    }
}

#[async_trait]
impl BookRepository for HttpBookRepository {
    type Error = HttpRepositoryError;

    async fn list(&self) -> Result<Vec<Book>, Self::Error> {
        tracing::debug!(url = %self.collection, "GET");
        let books = self
            .client
            .get(self.collection.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(books)
    }

    async fn create(&self, book: &NewBook) -> Result<Book, Self::Error> {
        tracing::debug!(url = %self.collection, "POST");
        let created = self
            .client
            .post(self.collection.clone())
            .json(book)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(created)
    }

    async fn update(&self, book: &Book) -> Result<Book, Self::Error> {
        let url = self.item_url(&book.id)?;
        tracing::debug!(url = %url, "PUT");
        let updated = self
            .client
            .put(url)
            .json(book)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(updated)
    }

    async fn delete(&self, id: &BookId) -> Result<(), Self::Error> {
        let url = self.item_url(id)?;
        tracing::debug!(url = %url, "DELETE");
        // レスポンスボディは使わない
        self.client.delete(url).send().await?.error_for_status()?;
        Ok(())
    }
}
