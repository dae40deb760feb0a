use async_trait::async_trait;
use futures_util::TryStreamExt;
use log::debug;
use mongodb::options::ReturnDocument;
use mongodb::{
    Client, Collection,
    bson::{Document, doc},
};

use crate::post::post_model::{NewPost, Post};
use crate::post::post_store::{PostStore, StoreError};

const POSTS_COLLECTION: &str = "posts";
const COUNTERS_COLLECTION: &str = "counters";
const POST_SEQUENCE: &str = "posts";

/// MongoDB-backed post store.
///
/// Integer ids come from a `counters` document that is incremented
/// atomically, so concurrent saves never share an id.
pub struct MongoPostStore {
    collection: Collection<Post>,
    counters: Collection<Document>,
}

impl MongoPostStore {
    pub fn new(client: &Client, database: &str) -> Self {
        let db = client.database(database);
        MongoPostStore {
            collection: db.collection::<Post>(POSTS_COLLECTION),
            counters: db.collection::<Document>(COUNTERS_COLLECTION),
        }
    }

    async fn next_id(&self) -> Result<i64, StoreError> {
        let counter = self
            .counters
            .find_one_and_update(
                doc! { "_id": POST_SEQUENCE },
                doc! { "$inc": { "seq": 1_i64 } },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| StoreError::Unavailable("post id counter missing".into()))?;

        counter
            .get_i64("seq")
            .map_err(|e| StoreError::InvalidDocument(format!("post id counter: {}", e)))
    }
}

#[async_trait]
impl PostStore for MongoPostStore {
    async fn save(&self, post: NewPost) -> Result<Post, StoreError> {
        let post = Post {
            id: self.next_id().await?,
            title: post.title,
            description: post.description,
        };

        self.collection.insert_one(&post).await?;
        debug!("Inserted post {}", post.id);

        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, StoreError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_all(&self) -> Result<Vec<Post>, StoreError> {
        let cursor = self.collection.find(doc! {}).sort(doc! { "_id": 1 }).await?;
        let posts: Vec<Post> = cursor.try_collect().await?;
        Ok(posts)
    }
}
