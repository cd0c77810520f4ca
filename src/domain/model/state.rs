use std::collections::HashSet;

use serde::Serialize;

use super::book::Book;
use super::id::BookId;

/// fetch失敗時にメッセージが空だった場合の既定文言
pub const FETCH_FALLBACK_ERROR: &str = "Failed to fetch books";

/// 状態遷移の一覧。Storeはこれ以外の方法でBookStateを変更しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookAction {
    FetchPending,
    FetchFulfilled(Vec<Book>),
    FetchRejected(String),
    Added(Book),
    Updated(Book),
    Deleted(BookId),
}

impl BookAction {
    /// ログ用の短い名前
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchPending => "fetch/pending",
            Self::FetchFulfilled(_) => "fetch/fulfilled",
            Self::FetchRejected(_) => "fetch/rejected",
            Self::Added(_) => "add/fulfilled",
            Self::Updated(_) => "update/fulfilled",
            Self::Deleted(_) => "delete/fulfilled",
        }
    }
}

/// Store State — Book一覧と fetch の状態フラグ。
/// itemsは常にid一意。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookState {
    items: Vec<Book>,
    loading: bool,
    error: Option<String>,
}

impl BookState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Book] {
        &self.items
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &BookId) -> Option<&Book> {
        self.items.iter().find(|b| &b.id == id)
    }

    pub fn position(&self, id: &BookId) -> Option<usize> {
        self.items.iter().position(|b| &b.id == id)
    }

    /// アクションを適用する（reducer）。
    pub fn apply(&mut self, action: BookAction) {
        match action {
            BookAction::FetchPending => {
                self.loading = true;
                self.error = None;
            }
            BookAction::FetchFulfilled(books) => {
                self.loading = false;
                self.items = dedup_by_id(books);
            }
            BookAction::FetchRejected(message) => {
                self.loading = false;
                self.error = Some(if message.is_empty() {
                    FETCH_FALLBACK_ERROR.to_string()
                } else {
                    message
                });
            }
            BookAction::Added(book) => {
                // 同一idが既にあれば古い方を捨てる
                self.items.retain(|b| b.id != book.id);
                self.items.insert(0, book);
            }
            BookAction::Updated(book) => {
                if let Some(idx) = self.position(&book.id) {
                    self.items[idx] = book;
                }
            }
            BookAction::Deleted(id) => {
                self.items.retain(|b| b.id != id);
            }
        }
    }
}

/// 最初の出現を残して重複idを落とす。
fn dedup_by_id(books: Vec<Book>) -> Vec<Book> {
    let mut seen = HashSet::with_capacity(books.len());
    let mut result = Vec::with_capacity(books.len());
    for book in books {
        if seen.insert(book.id.clone()) {
            result.push(book);
        } else {
            tracing::warn!(id = %book.id, "server returned duplicate book id, keeping first");
        }
    }
    result
}
