use std::sync::Arc;

use log::{error, info};

use crate::post::post_excel::{export_posts, parse_posts};
use crate::post::post_model::{PostDto, from_dto, to_dto};
use crate::post::post_store::PostStore;
use crate::utils::error::CustomError;
use crate::utils::uploads::FileValidator;

pub struct PostService {
    store: Arc<dyn PostStore>,
    validator: FileValidator,
}

impl PostService {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        PostService {
            store,
            validator: FileValidator::spreadsheets(),
        }
    }

    pub async fn get_all_posts(&self) -> Result<Vec<PostDto>, CustomError> {
        let posts = self.store.find_all().await?;
        Ok(posts.iter().map(to_dto).collect())
    }

    pub async fn get_post_by_id(&self, id: i64) -> Result<PostDto, CustomError> {
        self.store
            .find_by_id(id)
            .await?
            .map(|post| to_dto(&post))
            .ok_or(CustomError::NotFoundError(id))
    }

    pub async fn create_post(&self, input: PostDto) -> Result<PostDto, CustomError> {
        let saved = self.store.save(from_dto(input)).await?;
        Ok(to_dto(&saved))
    }

    /// Every post as an xlsx workbook.
    pub async fn generate_posts_excel(&self) -> Result<Vec<u8>, CustomError> {
        let posts = self.get_all_posts().await?;
        export_posts(&posts).map_err(|e| {
            error!("Error generating Excel file: {}", e);
            CustomError::io("Failed to generate Excel file", e)
        })
    }

    /// Create one post per valid row and return how many were queued.
    ///
    /// Rows are saved one at a time; a store failure stops the loop and
    /// leaves the rows saved so far in place.
    pub async fn upload_posts_from_excel(
        &self,
        data: &[u8],
        file_name: &str,
    ) -> Result<usize, CustomError> {
        self.validator
            .validate(file_name, data)
            .map_err(CustomError::InvalidInputError)?;

        let batch = parse_posts(data).map_err(|e| {
            error!("Error reading Excel file {}: {}", file_name, e);
            CustomError::io("Failed to read Excel file", e)
        })?;

        if batch.candidates.is_empty() {
            return Err(CustomError::invalid_input("no valid posts found"));
        }

        let count = batch.candidates.len();
        for candidate in batch.candidates {
            self.create_post(PostDto::new(candidate.title, candidate.description))
                .await?;
        }

        info!(
            "Successfully uploaded {} posts from Excel file {} ({} rows skipped)",
            count,
            file_name,
            batch.warnings.len()
        );
        Ok(count)
    }
}
