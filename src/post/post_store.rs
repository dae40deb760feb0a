use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::post::post_model::{NewPost, Post};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("invalid stored document: {0}")]
    InvalidDocument(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence capability for posts.
///
/// Implementations assign ids on `save` and must be safe to call from
/// concurrent requests.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Persist a new post and return it with its assigned id.
    async fn save(&self, post: NewPost) -> Result<Post, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, StoreError>;

    /// All posts in insertion order.
    async fn find_all(&self) -> Result<Vec<Post>, StoreError>;
}

/// Process-local store, ids start at 1.
#[derive(Default)]
pub struct InMemoryPostStore {
    inner: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    posts: Vec<Post>,
    last_id: i64,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn save(&self, post: NewPost) -> Result<Post, StoreError> {
        let mut state = self.inner.write().await;
        state.last_id += 1;
        let saved = Post {
            id: state.last_id,
            title: post.title,
            description: post.description,
        };
        state.posts.push(saved.clone());
        Ok(saved)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, StoreError> {
        let state = self.inner.read().await;
        Ok(state.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Post>, StoreError> {
        Ok(self.inner.read().await.posts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            description: String::new(),
        }
    }

    #[actix_web::test]
    async fn test_ids_are_sequential() {
        let store = InMemoryPostStore::new();
        let first = store.save(new_post("a")).await.unwrap();
        let second = store.save(new_post("b")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[actix_web::test]
    async fn test_find() {
        let store = InMemoryPostStore::new();
        store.save(new_post("a")).await.unwrap();
        store.save(new_post("b")).await.unwrap();

        assert_eq!(store.find_by_id(2).await.unwrap().unwrap().title, "b");
        assert!(store.find_by_id(3).await.unwrap().is_none());

        let titles: Vec<String> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["a", "b"]);
    }
}
