pub mod provider;

pub use provider::{FeaturedCategory, FeaturedGame, SteamConfig, SteamStoreClient};
