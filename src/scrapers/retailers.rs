//! Supported retailers and the offer-card layout of each one's offers page.

use super::html::{HtmlOfferScraper, OfferSelectors};
use super::ScraperConfig;

pub const ALBERT_HEIJN: &str = "Albert Heijn";
pub const JUMBO: &str = "Jumbo";
pub const LIDL: &str = "Lidl";
pub const DIRK: &str = "Dirk";

pub fn albert_heijn(config: &ScraperConfig) -> HtmlOfferScraper {
    HtmlOfferScraper::new(
        ALBERT_HEIJN,
        "https://www.ah.nl",
        "/bonus",
        OfferSelectors {
            card: "[data-testhook='promotion-card']",
            name: "[data-testhook='promotion-card-title']",
            category: Some("[data-testhook='promotion-card-taxonomy']"),
            original_price: Some("[data-testhook='price-was']"),
            discount_price: "[data-testhook='price-now']",
            validity: Some("[data-testhook='promotion-period']"),
            image: Some("img"),
            link: Some("a"),
            description: Some("[data-testhook='promotion-shields']"),
        },
        config.clone(),
    )
}

pub fn jumbo(config: &ScraperConfig) -> HtmlOfferScraper {
    HtmlOfferScraper::new(
        JUMBO,
        "https://www.jumbo.com",
        "/aanbiedingen/nu",
        OfferSelectors {
            card: "article.jum-promotion",
            name: ".jum-promotion__title",
            category: Some(".jum-promotion__category"),
            original_price: Some(".jum-price--old"),
            discount_price: ".jum-price--promo",
            validity: Some(".jum-promotion__date"),
            image: Some("img"),
            link: Some("a"),
            description: Some(".jum-tag"),
        },
        config.clone(),
    )
}

pub fn lidl(config: &ScraperConfig) -> HtmlOfferScraper {
    HtmlOfferScraper::new(
        LIDL,
        "https://www.lidl.nl",
        "/c/aanbiedingen/a10008785",
        OfferSelectors {
            card: "li.product-grid-box",
            name: ".product-grid-box__title",
            category: Some(".product-grid-box__brand"),
            original_price: Some(".m-price__rrp"),
            discount_price: ".m-price__price",
            validity: Some(".ribbon__text"),
            image: Some("img"),
            link: Some("a"),
            description: Some(".m-price__label"),
        },
        config.clone(),
    )
}

pub fn dirk(config: &ScraperConfig) -> HtmlOfferScraper {
    HtmlOfferScraper::new(
        DIRK,
        "https://www.dirk.nl",
        "/aanbiedingen",
        OfferSelectors {
            card: "article.product-card",
            name: ".product-card__name",
            category: None,
            original_price: Some(".product-card__price--regular"),
            discount_price: ".product-card__price--offer",
            validity: Some(".product-card__offer-period"),
            image: Some("img"),
            link: Some("a"),
            description: Some(".product-card__offer-label"),
        },
        config.clone(),
    )
}

pub fn all(config: &ScraperConfig) -> Vec<HtmlOfferScraper> {
    vec![albert_heijn(config), jumbo(config), lidl(config), dirk(config)]
}
