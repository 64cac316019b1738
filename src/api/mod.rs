// HTTP API for the game review front end
// Catalog search, Steam proxy, legacy reviews and the add-game workflow

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use error::{ApiError, FailurePolicy};
pub use server::ApiServer;
