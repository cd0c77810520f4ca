//! Shared test harness for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use book_store::application::store::BookStore;
use book_store::domain::model::book::{Book, NewBook};
use book_store::domain::model::id::BookId;
use book_store::domain::repository::BookRepository;

// =============================================================================
// FakeBookApi — テスト用リモートAPI
// =============================================================================

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FakeApiError(pub String);

#[derive(Default)]
struct FakeServer {
    books: Mutex<Vec<Book>>,
    next_id: AtomicUsize,
    fail_next: Mutex<Option<String>>,
    list_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

/// ネットワーク不要のインメモリAPI。Cloneしてもサーバー側の状態は共有される。
#[derive(Clone, Default)]
pub struct FakeBookApi {
    server: Arc<FakeServer>,
}

impl FakeBookApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// サーバー側に既存レコードを入れておく。
    pub fn with_books(books: Vec<Book>) -> Self {
        let api = Self::new();
        *api.server.books.lock().unwrap() = books;
        api
    }

    /// 次の1回の呼び出しを指定メッセージで失敗させる。
    pub fn fail_next(&self, message: &str) {
        *self.server.fail_next.lock().unwrap() = Some(message.to_string());
    }

    /// 次の`list`を、返したSenderが送信されるまで保留する。
    pub fn hold_next_list(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.server.list_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn set_server_books(&self, books: Vec<Book>) {
        *self.server.books.lock().unwrap() = books;
    }

    pub fn server_books(&self) -> Vec<Book> {
        self.server.books.lock().unwrap().clone()
    }

    fn check_failure(&self) -> Result<(), FakeApiError> {
        match self.server.fail_next.lock().unwrap().take() {
            Some(message) => Err(FakeApiError(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BookRepository for FakeBookApi {
    type Error = FakeApiError;

    async fn list(&self) -> Result<Vec<Book>, Self::Error> {
        let gate = self.server.list_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.check_failure()?;
        Ok(self.server_books())
    }

    async fn create(&self, book: &NewBook) -> Result<Book, Self::Error> {
        self.check_failure()?;
        let n = self.server.next_id.fetch_add(1, Ordering::SeqCst) + 100;
        let created = Book::with_id(BookId::new(n.to_string()).unwrap(), book.clone());
        self.server.books.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, book: &Book) -> Result<Book, Self::Error> {
        self.check_failure()?;
        let mut books = self.server.books.lock().unwrap();
        match books.iter_mut().find(|b| b.id == book.id) {
            Some(slot) => *slot = book.clone(),
            None => books.push(book.clone()),
        }
        Ok(book.clone())
    }

    async fn delete(&self, id: &BookId) -> Result<(), Self::Error> {
        self.check_failure()?;
        self.server.books.lock().unwrap().retain(|b| &b.id != id);
        Ok(())
    }
}

// =============================================================================
// Book作成ヘルパー
// =============================================================================

pub fn book(id: &str, title: &str) -> Book {
    Book {
        id: BookId::new(id).unwrap(),
        title: title.into(),
        author: "X".into(),
        year: 2000,
        category: "c".into(),
    }
}

pub fn new_book(title: &str) -> NewBook {
    NewBook {
        title: title.into(),
        author: "Y".into(),
        year: 2001,
        category: "c".into(),
    }
}

pub fn id(s: &str) -> BookId {
    BookId::new(s).unwrap()
}

pub fn ids(books: &[Book]) -> Vec<String> {
    books.iter().map(|b| b.id.to_string()).collect()
}

/// サーバーにbooksを置いて、fetch済みのStoreを返す。
pub async fn fetched_store(books: Vec<Book>) -> (BookStore<FakeBookApi>, FakeBookApi) {
    let api = FakeBookApi::with_books(books);
    let store = BookStore::new(api.clone());
    store.fetch_all().await.unwrap();
    (store, api)
}

// =============================================================================
// StubApi — HttpBookRepository用のローカルHTTPサーバー
// =============================================================================

/// StubApiが受けたリクエスト
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    /// JSONとして読めたボディ。空やJSON以外ならNone。
    pub body: Option<serde_json::Value>,
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: &'static str,
    delay: Duration,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// どのパスにも固定のステータスとJSONボディを返すaxumサーバー。
/// 受けたリクエストは順に記録する。
pub struct StubApi {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubApi {
    pub async fn start(status: u16, body: &'static str) -> Self {
        Self::start_delayed(status, body, Duration::ZERO).await
    }

    /// 応答前に`delay`だけ待つ。
    pub async fn start_delayed(status: u16, body: &'static str, delay: Duration) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            status: StatusCode::from_u16(status).unwrap(),
            body,
            delay,
            requests: requests.clone(),
        };
        let app = Router::new().fallback(respond).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            url: format!("http://{addr}"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// 1件だけ受けたことを確かめて、そのリクエストを返す。
    pub fn single_request(&self) -> RecordedRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "unexpected requests: {requests:?}");
        requests[0].clone()
    }
}

async fn respond(
    State(stub): State<StubState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> impl IntoResponse {
    stub.requests.lock().unwrap().push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        body: serde_json::from_slice(&body).ok(),
    });
    if !stub.delay.is_zero() {
        tokio::time::sleep(stub.delay).await;
    }
    (
        stub.status,
        [(header::CONTENT_TYPE, "application/json")],
        stub.body,
    )
}

/// システムのプロキシ設定に影響されないクライアント
pub fn direct_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
