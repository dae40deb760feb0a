pub mod not_found;
