use super::post_controller::{
    create_post, download_posts_excel, get_all_posts, get_post, upload_posts_excel,
};
use actix_web::web;

pub fn post_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/posts")
            .route("", web::get().to(get_all_posts))
            .route("", web::post().to(create_post))
            .route("/download/excel", web::get().to(download_posts_excel))
            .route("/upload/excel", web::post().to(upload_posts_excel))
            .route("/{id}", web::get().to(get_post)),
    );
}
