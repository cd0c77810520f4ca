use serde::{Deserialize, Serialize};

use super::id::BookId;

/// 新規作成リクエスト（idはサーバーが採番するため持たない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub year: i32,
    pub category: String,
}

/// リモートAPIが返すBookレコード。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub year: i32,
    pub category: String,
}

impl Book {
    /// 採番済みidと作成リクエストからBookを組み立てる。
    pub fn with_id(id: BookId, new: NewBook) -> Self {
        Self {
            id,
            title: new.title,
            author: new.author,
            year: new.year,
            category: new.category,
        }
    }
}
