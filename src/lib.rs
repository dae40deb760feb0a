pub mod database;
pub mod middleware;
pub mod post;
pub mod router;
pub mod spreadsheet;
pub mod utils;
