use tokio::sync::watch;

use crate::domain::model::book::{Book, NewBook};
use crate::domain::model::id::BookId;
use crate::domain::model::state::{BookAction, BookState};
use crate::domain::repository::BookRepository;

use super::error::AppError;

/// Book一覧のクライアント側Store。
/// call remote → dispatch action のパターンで操作する。
///
/// 各操作は `&self` で呼べるため、同時に複数発行してよい（排他なし）。
/// 後に完了した操作の結果が最後に反映される。
pub struct BookStore<R: BookRepository> {
    repo: R,
    state: watch::Sender<BookState>,
}

impl<R: BookRepository> BookStore<R> {
    pub fn new(repo: R) -> Self {
        let (state, _) = watch::channel(BookState::new());
        Self { repo, state }
    }

    /// 現在の状態のコピー
    pub fn snapshot(&self) -> BookState {
        self.state.borrow().clone()
    }

    /// 状態変更の購読。dispatchのたびに通知される。
    pub fn subscribe(&self) -> watch::Receiver<BookState> {
        self.state.subscribe()
    }

    /// 一覧を取得してitemsを丸ごと置き換える。
    /// 失敗はstateの`error`にも記録される。
    pub async fn fetch_all(&self) -> Result<(), AppError> {
        self.dispatch(BookAction::FetchPending);
        match self.repo.list().await {
            Ok(books) => {
                tracing::info!(count = books.len(), "fetched books");
                self.dispatch(BookAction::FetchFulfilled(books));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "fetch books failed");
                self.dispatch(BookAction::FetchRejected(e.to_string()));
                Err(AppError::Remote(Box::new(e)))
            }
        }
    }

    /// Bookを作成し、採番済みのBookを先頭に追加する。
    pub async fn add(&self, book: NewBook) -> Result<Book, AppError> {
        let created = self.repo.create(&book).await.map_err(Self::remote)?;
        tracing::info!(id = %created.id, "created book");
        self.dispatch(BookAction::Added(created.clone()));
        Ok(created)
    }

    /// Bookを置き換える。手元にないidなら一覧は変わらない。
    pub async fn update(&self, book: Book) -> Result<Book, AppError> {
        let updated = self.repo.update(&book).await.map_err(Self::remote)?;
        tracing::info!(id = %updated.id, "updated book");
        self.dispatch(BookAction::Updated(updated.clone()));
        Ok(updated)
    }

    /// Bookを削除する。
    pub async fn delete(&self, id: BookId) -> Result<(), AppError> {
        self.repo.delete(&id).await.map_err(Self::remote)?;
        tracing::info!(id = %id, "deleted book");
        self.dispatch(BookAction::Deleted(id));
        Ok(())
    }

    // --- private ---

    fn dispatch(&self, action: BookAction) {
        tracing::debug!(action = action.name(), "dispatch");
        self.state.send_modify(|state| state.apply(action));
    }

    fn remote(e: R::Error) -> AppError {
        tracing::warn!(error = %e, "remote call failed");
        AppError::Remote(Box::new(e))
    }
}
