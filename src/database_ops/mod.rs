pub mod catalog_insert;
pub mod db;
pub mod reviews;
pub mod search;
pub mod steam;
