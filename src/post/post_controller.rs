use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, web};
use log::{error, info};

use crate::post::post_model::PostDto;
use crate::post::post_service::PostService;
use crate::utils::error::CustomError;
use crate::utils::uploads::extract_file_field;

const EXPORT_FILE_NAME: &str = "posts.xlsx";
const UPLOAD_FIELD: &str = "file";

pub async fn get_all_posts(
    post_service: web::Data<PostService>,
) -> Result<HttpResponse, CustomError> {
    let posts = post_service.get_all_posts().await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn get_post(
    post_id: web::Path<i64>,
    post_service: web::Data<PostService>,
) -> Result<HttpResponse, CustomError> {
    let post = post_service.get_post_by_id(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn create_post(
    post_service: web::Data<PostService>,
    post: web::Json<PostDto>,
) -> Result<HttpResponse, CustomError> {
    let created = post_service.create_post(post.into_inner()).await?;
    Ok(HttpResponse::Ok().json(created))
}

/// GET /posts/download/excel
pub async fn download_posts_excel(
    post_service: web::Data<PostService>,
) -> Result<HttpResponse, CustomError> {
    let workbook = post_service.generate_posts_excel().await?;

    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(EXPORT_FILE_NAME.to_string())],
        })
        .body(workbook))
}

/// POST /posts/upload/excel
///
/// Replies in plain text: 400 for rejected input, 500 for anything else.
pub async fn upload_posts_excel(
    post_service: web::Data<PostService>,
    payload: Multipart,
) -> HttpResponse {
    match import_upload(&post_service, payload).await {
        Ok(count) => HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(format!(
                "Successfully uploaded {} posts from Excel file",
                count
            )),
        Err(CustomError::InvalidInputError(message)) => {
            info!("Rejected Excel upload: {}", message);
            HttpResponse::BadRequest()
                .content_type("text/plain; charset=utf-8")
                .body(format!("Error: {}", message))
        }
        Err(e) => {
            error!("Excel upload failed: {:?}", e);
            HttpResponse::InternalServerError()
                .content_type("text/plain; charset=utf-8")
                .body(format!("Failed to upload Excel file: {}", e))
        }
    }
}

async fn import_upload(
    post_service: &PostService,
    payload: Multipart,
) -> Result<usize, CustomError> {
    let file = extract_file_field(payload, UPLOAD_FIELD)
        .await
        .map_err(CustomError::InvalidInputError)?
        .ok_or_else(|| {
            CustomError::invalid_input(format!("missing multipart field '{}'", UPLOAD_FIELD))
        })?;

    info!(
        "Received Excel upload {} ({} bytes, {})",
        file.file_name,
        file.size(),
        file.content_type.as_deref().unwrap_or("unknown type")
    );

    post_service
        .upload_posts_from_excel(&file.data, &file.file_name)
        .await
}
