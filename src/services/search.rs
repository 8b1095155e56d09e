// src/services/search.rs

//! Vacancy search against the hh.ru public API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{RawListing, SearchConfig, Subscription};
use crate::services::areas::resolve_area;
use crate::utils::{endpoint, http};

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    /// Items in source order
    pub items: Vec<RawListing>,
    /// Total matches reported by the source
    pub found: u64,
}

/// Source of candidate listings.
///
/// Implementations never fail: any transport or decoding problem yields an
/// empty page so the caller simply sees zero candidates.
#[async_trait]
pub trait SearchPort: Send + Sync {
    async fn search(&self, criteria: &Subscription, page_size: usize, page: usize) -> SearchPage;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Value>,
    #[serde(default)]
    found: u64,
}

/// hh.ru `/vacancies` client.
pub struct HhClient {
    client: Client,
    base_url: String,
}

impl HhClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(&config.user_agent, config.timeout_secs)?,
            base_url: config.base_url.clone(),
        })
    }

    async fn fetch(&self, criteria: &Subscription, page_size: usize, page: usize) -> Result<SearchPage> {
        let url = endpoint(&self.base_url, "vacancies")?;
        let response = self
            .client
            .get(url)
            .query(&build_query(criteria, page_size, page))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream {
                service: "hh.ru",
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        decode_page(&response.text().await?)
    }
}

#[async_trait]
impl SearchPort for HhClient {
    async fn search(&self, criteria: &Subscription, page_size: usize, page: usize) -> SearchPage {
        match self.fetch(criteria, page_size, page).await {
            Ok(result) => {
                log::info!(
                    "Found {} vacancies for query {:?} (subscription {})",
                    result.found,
                    criteria.keywords,
                    criteria.id
                );
                result
            }
            Err(e) => {
                log::error!(
                    "Error fetching vacancies for subscription {}: {}",
                    criteria.id,
                    e
                );
                SearchPage::default()
            }
        }
    }
}

/// Query parameters for one search request.
fn build_query(criteria: &Subscription, page_size: usize, page: usize) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("text", criteria.keywords.trim().to_string()),
        ("per_page", page_size.to_string()),
        ("page", page.to_string()),
    ];

    if let Some(area) = criteria.location_filter.as_deref().and_then(resolve_area) {
        params.push(("area", area));
    }

    if let Some(experience) = criteria
        .experience_filter
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
    {
        params.push(("experience", experience.to_string()));
    }

    match criteria.min_salary.filter(|s| *s > 0) {
        Some(salary) => {
            params.push(("salary", salary.to_string()));
            params.push(("only_with_salary", "true".to_string()));
        }
        None => params.push(("only_with_salary", "false".to_string())),
    }

    params
}

/// Decode a response body, dropping items that do not fit [`RawListing`].
fn decode_page(body: &str) -> Result<SearchPage> {
    let response: SearchResponse = serde_json::from_str(body)?;

    let mut items = Vec::with_capacity(response.items.len());
    for (index, item) in response.items.into_iter().enumerate() {
        match serde_json::from_value::<RawListing>(item) {
            Ok(listing) => items.push(listing),
            Err(e) => log::warn!("Skipping malformed search item #{}: {}", index, e),
        }
    }

    Ok(SearchPage {
        items,
        found: response.found,
    })
}
