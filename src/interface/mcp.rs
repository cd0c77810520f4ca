//! MCP Server for book-store
//!
//! MCP Protocol (stdio) <-> application::BookStore <-> REST `/books`
//!
//! 5 tools: books_fetch, books_list, book_add, book_update, book_delete

use std::sync::Arc;

use rmcp::{
    handler::server::{tool::ToolCallContext, tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
    transport::stdio,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::application::error::AppError;
use crate::application::store::BookStore;
use crate::domain::model::book::{Book, NewBook};
use crate::domain::model::id::BookId;
use crate::domain::model::state::BookState;
use crate::infra::config::ClientConfig;
use crate::infra::http::HttpBookRepository;

// =============================================================================
// Public entry point
// =============================================================================

/// MCP Serverを起動する。StoreはこのプロセスのSession中だけ生きる。
pub async fn run(config: ClientConfig) -> anyhow::Result<()> {
    let repo = HttpBookRepository::new(&config)?;
    tracing::info!(url = %repo.collection_url(), "serving book store over stdio");
    let server = BookStoreMcpServer::new(Arc::new(BookStore::new(repo)));
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

// =============================================================================
// MCP Server
// =============================================================================

#[derive(Clone)]
struct BookStoreMcpServer {
    store: Arc<BookStore<HttpBookRepository>>,
    tool_router: ToolRouter<Self>,
}

impl BookStoreMcpServer {
    fn new(store: Arc<BookStore<HttpBookRepository>>) -> Self {
        Self {
            store,
            tool_router: Self::tool_router(),
        }
    }

    fn to_mcp_error(e: AppError) -> McpError {
        McpError::internal_error(format!("{e}"), None)
    }
}

// =============================================================================
// ServerHandler impl
// =============================================================================

impl ServerHandler for BookStoreMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "book-store".to_string(),
                title: Some("Book Store: REST-backed book list".to_string()),
                description: Some(
                    "Client-side list of books mirrored from a REST API. \
                     `books_fetch` reloads from the server, `books_list` reads the local copy."
                        .to_string(),
                ),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Manage the book list kept in sync with the remote `/books` API.\n\
                 \n\
                 Tools: `books_fetch` → `books_list`, then `book_add`/`book_update`/`book_delete`. \
                 Book IDs are assigned by the server; use the IDs shown by `books_list`."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool_ctx = ToolCallContext::new(self, request, context);
        self.tool_router.call(tool_ctx).await
    }
}

// =============================================================================
// Formatting & parsing helpers
// =============================================================================

fn format_book(book: &Book) -> String {
    format!(
        "[{}] {} by {} ({}, {})",
        book.id, book.title, book.author, book.year, book.category
    )
}

/// Stateを一覧テキストにする。loading/errorがあれば先頭に出す。
fn format_state(state: &BookState) -> String {
    let mut out = String::new();
    if state.loading() {
        out.push_str("Loading...\n");
    }
    if let Some(error) = state.error() {
        out.push_str(&format!("Last fetch failed: {error}\n"));
    }
    if state.is_empty() {
        out.push_str("No books loaded. Use `books_fetch` to load from the server.");
        return out;
    }
    let lines: Vec<String> = state
        .items()
        .iter()
        .enumerate()
        .map(|(i, b)| format!("{}. {}", i + 1, format_book(b)))
        .collect();
    out.push_str(&lines.join("\n"));
    out
}

fn parse_book_id(s: &str) -> Result<BookId, McpError> {
    BookId::new(s.trim())
        .map_err(|e| McpError::invalid_params(format!("Invalid book id '{s}': {e}"), None))
}

/// 省略されたフィールドを手元のBookで補って、PUT用の完全なBookを作る。
fn merge_update(current: Option<&Book>, req: McpBookUpdateRequest) -> Result<Book, McpError> {
    let id = parse_book_id(&req.id)?;
    let missing = |field: &str| {
        McpError::invalid_params(
            format!(
                "Book '{id}' is not in the local list; `{field}` is required \
                 (or run `books_fetch` first)."
            ),
            None,
        )
    };

    let title = match (req.title, current) {
        (Some(v), _) => v,
        (None, Some(b)) => b.title.clone(),
        (None, None) => return Err(missing("title")),
    };
    let author = match (req.author, current) {
        (Some(v), _) => v,
        (None, Some(b)) => b.author.clone(),
        (None, None) => return Err(missing("author")),
    };
    let year = match (req.year, current) {
        (Some(v), _) => v,
        (None, Some(b)) => b.year,
        (None, None) => return Err(missing("year")),
    };
    let category = match (req.category, current) {
        (Some(v), _) => v,
        (None, Some(b)) => b.category.clone(),
        (None, None) => return Err(missing("category")),
    };

    Ok(Book {
        id,
        title,
        author,
        year,
        category,
    })
}

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpEmptyRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookAddRequest {
    #[schemars(description = "Book title")]
    pub title: String,
    #[schemars(description = "Author name")]
    pub author: String,
    #[schemars(description = "Publication year")]
    pub year: i32,
    #[schemars(description = "Category (e.g. 'novel', 'science')")]
    pub category: String,
}

impl From<McpBookAddRequest> for NewBook {
    fn from(req: McpBookAddRequest) -> Self {
        Self {
            title: req.title,
            author: req.author,
            year: req.year,
            category: req.category,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookUpdateRequest {
    #[schemars(description = "Book ID from `books_list` output")]
    pub id: String,
    #[schemars(description = "New title (omit to keep current)")]
    pub title: Option<String>,
    #[schemars(description = "New author (omit to keep current)")]
    pub author: Option<String>,
    #[schemars(description = "New year (omit to keep current)")]
    pub year: Option<i32>,
    #[schemars(description = "New category (omit to keep current)")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookDeleteRequest {
    #[schemars(description = "Book ID from `books_list` output")]
    pub id: String,
}

// =============================================================================
// Tool implementations
// =============================================================================

#[tool_router]
impl BookStoreMcpServer {
    #[tool(
        name = "books_fetch",
        description = "Reload the whole book list from the server, replacing the local copy. Returns the refreshed list.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = true
        )
    )]
    async fn books_fetch(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpEmptyRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.store.fetch_all().await.map_err(Self::to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(format_state(
            &self.store.snapshot(),
        ))]))
    }

    #[tool(
        name = "books_list",
        description = "Show the local book list with IDs, plus loading/error status. No network call.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn books_list(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpEmptyRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(format_state(
            &self.store.snapshot(),
        ))]))
    }

    #[tool(
        name = "book_add",
        description = "Create a book on the server. The server assigns the ID; the new book is put at the top of the list.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = false,
            open_world_hint = true
        )
    )]
    async fn book_add(
        &self,
        Parameters(req): Parameters<McpBookAddRequest>,
    ) -> Result<CallToolResult, McpError> {
        let created = self
            .store
            .add(req.into())
            .await
            .map_err(Self::to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Created: {}",
            format_book(&created)
        ))]))
    }

    #[tool(
        name = "book_update",
        description = "Replace a book on the server by ID. Omitted fields keep their current local values.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = true
        )
    )]
    async fn book_update(
        &self,
        Parameters(req): Parameters<McpBookUpdateRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.store.snapshot();
        let current = BookId::new(req.id.trim())
            .ok()
            .and_then(|id| state.get(&id).cloned());
        let book = merge_update(current.as_ref(), req)?;

        let updated = self.store.update(book).await.map_err(Self::to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Updated: {}",
            format_book(&updated)
        ))]))
    }

    #[tool(
        name = "book_delete",
        description = "Delete a book on the server by ID and drop it from the local list.",
        annotations(
            read_only_hint = false,
            destructive_hint = true,
            idempotent_hint = true,
            open_world_hint = true
        )
    )]
    async fn book_delete(
        &self,
        Parameters(req): Parameters<McpBookDeleteRequest>,
    ) -> Result<CallToolResult, McpError> {
        let id = parse_book_id(&req.id)?;
        self.store
            .delete(id.clone())
            .await
            .map_err(Self::to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Deleted: {id}"
        ))]))
    }
}
