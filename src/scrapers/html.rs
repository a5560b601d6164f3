//! Offer-page adapter shared by the retailer scrapers.
//!
//! Fetches a retailer's offers page and turns every product card into a
//! `RawObservation`. Missing card fields are left absent; the normalizer decides
//! whether the observation is usable.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use super::parser::parse_validity;
use super::{RawObservation, RawPrice, RawTimestamp, ScraperConfig, SourceAdapter};
use crate::error::{AggregatorError, Result};

/// CSS selectors locating the fields of one product card
#[derive(Debug, Clone)]
pub struct OfferSelectors {
    pub card: &'static str,
    pub name: &'static str,
    pub category: Option<&'static str>,
    pub original_price: Option<&'static str>,
    pub discount_price: &'static str,
    pub validity: Option<&'static str>,
    pub image: Option<&'static str>,
    pub link: Option<&'static str>,
    pub description: Option<&'static str>,
}

pub struct HtmlOfferScraper {
    name: String,
    base_url: String,
    offers_path: String,
    selectors: OfferSelectors,
    config: ScraperConfig,
    // Lazily built per run and dropped again on close
    session: Mutex<Option<Client>>,
}

impl HtmlOfferScraper {
    pub fn new(
        name: &str,
        base_url: &str,
        offers_path: &str,
        selectors: OfferSelectors,
        config: ScraperConfig,
    ) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            offers_path: offers_path.to_string(),
            selectors,
            config,
            session: Mutex::new(None),
        }
    }

    pub fn offers_url(&self) -> String {
        format!("{}{}", self.base_url, self.offers_path)
    }

    fn session(&self) -> Result<Client> {
        let mut session = self.session.lock();
        if let Some(client) = session.as_ref() {
            return Ok(client.clone());
        }

        let client = Client::builder()
            .timeout(self.config.request_timeout)
            .user_agent(self.config.user_agent.clone())
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .map_err(|e| AggregatorError::source_unavailable(&self.name, e))?;

        *session = Some(client.clone());
        Ok(client)
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let client = self.session()?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| AggregatorError::source_unavailable(&self.name, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AggregatorError::source_unavailable(
                &self.name,
                format!("HTTP {} from {}", status, url),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| AggregatorError::source_unavailable(&self.name, e))
    }

    /// Parse every product card of an offers page
    pub fn parse_offers(&self, html: &str) -> Result<Vec<RawObservation>> {
        let document = Html::parse_document(html);
        let card_selector = self.selector(self.selectors.card)?;
        let fields = CardSelectors {
            name: self.selector(self.selectors.name)?,
            category: self.optional_selector(self.selectors.category)?,
            original_price: self.optional_selector(self.selectors.original_price)?,
            discount_price: self.selector(self.selectors.discount_price)?,
            validity: self.optional_selector(self.selectors.validity)?,
            image: self.optional_selector(self.selectors.image)?,
            link: self.optional_selector(self.selectors.link)?,
            description: self.optional_selector(self.selectors.description)?,
        };

        Ok(document
            .select(&card_selector)
            .map(|card| self.parse_card(card, &fields))
            .collect())
    }

    fn parse_card(&self, card: ElementRef<'_>, fields: &CardSelectors) -> RawObservation {
        let (valid_from, valid_until) = fields
            .validity
            .as_ref()
            .and_then(|s| first_text(card, s))
            .map(|text| parse_validity(&text))
            .unwrap_or((None, None));

        RawObservation {
            product_name: first_text(card, &fields.name),
            category: fields.category.as_ref().and_then(|s| first_text(card, s)),
            original_price: fields
                .original_price
                .as_ref()
                .and_then(|s| first_text(card, s))
                .map(RawPrice::Text),
            discount_price: first_text(card, &fields.discount_price).map(RawPrice::Text),
            discount_percentage: None,
            valid_from: valid_from.map(RawTimestamp::At),
            valid_until: valid_until.map(RawTimestamp::At),
            image_url: fields
                .image
                .as_ref()
                .and_then(|s| first_attr(card, s, "src"))
                .map(|src| self.absolute_url(&src)),
            product_url: fields
                .link
                .as_ref()
                .and_then(|s| first_attr(card, s, "href"))
                .map(|href| self.absolute_url(&href)),
            description: fields.description.as_ref().and_then(|s| first_text(card, s)),
            is_active: None,
        }
    }

    fn absolute_url(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            format!("{}/{}", self.base_url, link.trim_start_matches('/'))
        }
    }

    fn selector(&self, css: &str) -> Result<Selector> {
        Selector::parse(css).map_err(|e| {
            AggregatorError::source_unavailable(&self.name, format!("bad selector {css}: {e}"))
        })
    }

    fn optional_selector(&self, css: Option<&str>) -> Result<Option<Selector>> {
        css.map(|css| self.selector(css)).transpose()
    }
}

struct CardSelectors {
    name: Selector,
    category: Option<Selector>,
    original_price: Option<Selector>,
    discount_price: Selector,
    validity: Option<Selector>,
    image: Option<Selector>,
    link: Option<Selector>,
    description: Option<Selector>,
}

fn first_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
}

fn first_attr(card: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    card.select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl SourceAdapter for HtmlOfferScraper {
    fn name(&self) -> &str {
        &self.name
    }

    async fn collect(&self) -> Result<Vec<RawObservation>> {
        let url = self.offers_url();
        tracing::info!(source = %self.name, url = %url, "Fetching offers page");

        let html = self.fetch_page(&url).await?;
        let observations = self.parse_offers(&html)?;

        tracing::info!(
            source = %self.name,
            count = observations.len(),
            "Scraped offer cards"
        );
        Ok(observations)
    }

    async fn close(&self) {
        if self.session.lock().take().is_some() {
            tracing::debug!(source = %self.name, "Closed HTTP session");
        }
    }
}
