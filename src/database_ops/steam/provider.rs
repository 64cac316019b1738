use crate::util::env as env_util;
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_STORE_URL: &str = "https://store.steampowered.com";
// The storefront rejects default client identifiers on appdetails.
const DETAILS_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const FEATURED_USER_AGENT: &str = "Mozilla/5.0";

/// Where and how to reach the storefront.
#[derive(Debug, Clone)]
pub struct SteamConfig {
    pub store_url: String,
    pub country: String,
    pub language: String,
    pub details_user_agent: String,
    pub featured_user_agent: String,
    pub timeout: Option<Duration>,
}

impl Default for SteamConfig {
    fn default() -> Self {
        Self {
            store_url: DEFAULT_STORE_URL.to_string(),
            country: "US".to_string(),
            language: "en".to_string(),
            details_user_agent: DETAILS_USER_AGENT.to_string(),
            featured_user_agent: FEATURED_USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

impl SteamConfig {
    /// Env: STEAM_STORE_URL, STEAM_COUNTRY (default US), STEAM_LANGUAGE (default en),
    /// STEAM_USER_AGENT, STEAM_TIMEOUT_SECS (unset = no timeout).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            store_url: env_util::env_or("STEAM_STORE_URL", &defaults.store_url)
                .trim_end_matches('/')
                .to_string(),
            country: env_util::env_or("STEAM_COUNTRY", &defaults.country),
            language: env_util::env_or("STEAM_LANGUAGE", &defaults.language),
            details_user_agent: env_util::env_or("STEAM_USER_AGENT", &defaults.details_user_agent),
            featured_user_agent: defaults.featured_user_agent,
            timeout: env_util::env_parse_opt::<u64>("STEAM_TIMEOUT_SECS").map(Duration::from_secs),
        }
    }
}

/// Which upstream featured sub-list to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeaturedCategory {
    #[default]
    Popular,
    Recent,
    Trending,
}

impl FeaturedCategory {
    /// Unknown tags fall back to [`FeaturedCategory::Popular`].
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "recent" => FeaturedCategory::Recent,
            "trending" => FeaturedCategory::Trending,
            _ => FeaturedCategory::Popular,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeaturedCategory::Popular => "popular",
            FeaturedCategory::Recent => "recent",
            FeaturedCategory::Trending => "trending",
        }
    }
}

impl fmt::Display for FeaturedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Deserialize)]
struct FeaturedResponse {
    #[serde(default)]
    featured_win: Option<Vec<FeaturedEntry>>,
    #[serde(default)]
    featured_mac: Option<Vec<FeaturedEntry>>,
    #[serde(default)]
    featured_linux: Option<Vec<FeaturedEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
struct FeaturedEntry {
    id: Value,
    name: String,
    #[serde(default)]
    large_capsule_image: Option<String>,
    #[serde(default)]
    header_image: Option<String>,
    #[serde(default)]
    final_price: Option<i64>,
}

/// A featured storefront entry reshaped into catalog field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturedGame {
    pub appid: String,
    pub nome: String,
    pub imagem_url: Option<String>,
    pub nome_normalizado: String,
    pub tipo: String,
    pub price: Option<f64>,
}

impl FeaturedResponse {
    fn select(self, category: FeaturedCategory) -> Vec<FeaturedEntry> {
        let FeaturedResponse {
            featured_win,
            featured_mac,
            featured_linux,
        } = self;
        let chosen = match category {
            FeaturedCategory::Recent => featured_mac,
            FeaturedCategory::Trending => featured_linux,
            FeaturedCategory::Popular => None,
        };
        match chosen {
            Some(list) if !list.is_empty() => list,
            _ => featured_win.unwrap_or_default(),
        }
    }
}

fn id_to_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.is_empty())
}

impl From<FeaturedEntry> for FeaturedGame {
    fn from(entry: FeaturedEntry) -> Self {
        let price = entry
            .final_price
            .filter(|p| *p != 0)
            .map(|minor| minor as f64 / 100.0);
        FeaturedGame {
            appid: id_to_string(&entry.id),
            nome_normalizado: entry.name.to_lowercase(),
            imagem_url: non_empty(entry.large_capsule_image)
                .or_else(|| non_empty(entry.header_image)),
            nome: entry.name,
            tipo: "steam".to_string(),
            price,
        }
    }
}

/// Pull the inner payload for `appid` out of an appdetails body.
/// `None` unless the upstream success flag for that id is `true`.
fn extract_app_details(mut body: Value, appid: &str) -> Option<Value> {
    let entry = body.get_mut(appid)?;
    if entry.get("success").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    Some(entry.get_mut("data").map(Value::take).unwrap_or(Value::Null))
}

/// Thin client over the public storefront endpoints. One fresh round trip per
/// call: no retry, no cache.
#[derive(Clone)]
pub struct SteamStoreClient {
    client: Client,
    config: SteamConfig,
}

impl SteamStoreClient {
    pub fn new(config: SteamConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build steam http client")?;
        info!(store_url = %config.store_url, country = %config.country, "steam client ready");
        Ok(Self { client, config })
    }

    /// Fetch app details. `Ok(None)` when the storefront reports failure for the id.
    pub async fn app_details(&self, appid: &str) -> Result<Option<Value>> {
        let url = format!("{}/api/appdetails", self.config.store_url);
        debug!(appid, "fetching steam appdetails");
        let body = self
            .client
            .get(&url)
            .query(&[
                ("appids", appid),
                ("cc", self.config.country.as_str()),
                ("l", self.config.language.as_str()),
            ])
            .header(reqwest::header::USER_AGENT, &self.config.details_user_agent)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()?
            .json::<Value>()
            .await
            .context("appdetails body is not JSON")?;
        Ok(extract_app_details(body, appid))
    }

    /// Fetch the featured document once and reshape the sub-list for `category`.
    pub async fn featured(&self, category: FeaturedCategory) -> Result<Vec<FeaturedGame>> {
        let url = format!("{}/api/featured/", self.config.store_url);
        let body = self
            .client
            .get(&url)
            .query(&[
                ("cc", self.config.country.as_str()),
                ("l", self.config.language.as_str()),
            ])
            .header(reqwest::header::USER_AGENT, &self.config.featured_user_agent)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()?
            .json::<Value>()
            .await
            .context("featured body is not JSON")?;
        let parsed: FeaturedResponse = serde_json::from_value(body)
            .map_err(|e| anyhow!("unexpected featured shape: {e}"))?;
        Ok(parsed
            .select(category)
            .into_iter()
            .map(FeaturedGame::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn featured_doc() -> Value {
        json!({
            "featured_win": [
                {"id": 570, "name": "Dota 2", "large_capsule_image": "https://cdn/570.jpg", "final_price": 0},
                {"id": 620, "name": "Portal 2", "large_capsule_image": "", "header_image": "https://cdn/620_h.jpg", "final_price": 999}
            ],
            "featured_mac": [],
            "featured_linux": [
                {"id": "730", "name": "Counter-Strike 2", "header_image": "https://cdn/730_h.jpg"}
            ]
        })
    }

    fn reshape(doc: Value, category: FeaturedCategory) -> Vec<FeaturedGame> {
        let parsed: FeaturedResponse = serde_json::from_value(doc).unwrap();
        parsed.select(category).into_iter().map(FeaturedGame::from).collect()
    }

    #[test]
    fn category_parsing_falls_back_to_popular() {
        assert_eq!(FeaturedCategory::parse("recent"), FeaturedCategory::Recent);
        assert_eq!(FeaturedCategory::parse("TRENDING"), FeaturedCategory::Trending);
        assert_eq!(FeaturedCategory::parse("popular"), FeaturedCategory::Popular);
        assert_eq!(FeaturedCategory::parse("whatever"), FeaturedCategory::Popular);
    }

    #[test]
    fn reshapes_entries_into_catalog_fields() {
        let games = reshape(featured_doc(), FeaturedCategory::Popular);
        assert_eq!(games.len(), 2);

        assert_eq!(games[0].appid, "570");
        assert_eq!(games[0].nome_normalizado, "dota 2");
        assert_eq!(games[0].imagem_url.as_deref(), Some("https://cdn/570.jpg"));
        assert_eq!(games[0].tipo, "steam");
        assert_eq!(games[0].price, None);

        assert_eq!(games[1].imagem_url.as_deref(), Some("https://cdn/620_h.jpg"));
        assert_eq!(games[1].price, Some(9.99));
    }

    #[test]
    fn empty_sub_list_falls_back_to_windows_list() {
        let games = reshape(featured_doc(), FeaturedCategory::Recent);
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].appid, "570");

        let trending = reshape(featured_doc(), FeaturedCategory::Trending);
        assert_eq!(trending.len(), 1);
        assert_eq!(trending[0].appid, "730");
    }

    #[test]
    fn missing_lists_yield_nothing() {
        assert!(reshape(json!({}), FeaturedCategory::Trending).is_empty());
        assert!(reshape(json!({"featured_win": null}), FeaturedCategory::Popular).is_empty());
    }

    #[test]
    fn entry_without_name_is_a_shape_error() {
        let doc = json!({"featured_win": [{"id": 1}]});
        assert!(serde_json::from_value::<FeaturedResponse>(doc).is_err());
    }

    #[test]
    fn app_details_require_success_flag() {
        let ok = json!({"10": {"success": true, "data": {"name": "Super Mario Bros"}}});
        assert_eq!(
            extract_app_details(ok, "10"),
            Some(json!({"name": "Super Mario Bros"}))
        );

        let failed = json!({"10": {"success": false, "data": {"name": "ignored"}}});
        assert_eq!(extract_app_details(failed, "10"), None);

        let odd = json!({"10": {"success": "yes"}});
        assert_eq!(extract_app_details(odd, "10"), None);

        let other_id = json!({"11": {"success": true, "data": {}}});
        assert_eq!(extract_app_details(other_id, "10"), None);
        assert_eq!(extract_app_details(Value::Null, "10"), None);
    }
}
