//! Menu link discovery service.
//!
//! Finds menu sources on a restaurant homepage by looking at anchor text,
//! link targets and prices printed on the page itself.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{DiscoveryConfig, MenuSourceCandidate, SourceKind};
use crate::utils::http::{Transport, fetch_html};
use crate::utils::{PRICE_PATTERN, classify, looks_like_menu, normalize_url};

/// Service for discovering menu sources on restaurant websites.
pub struct MenuLinkFinder<'a> {
    transport: &'a dyn Transport,
    config: DiscoveryConfig,
}

impl<'a> MenuLinkFinder<'a> {
    /// Create a new menu link finder.
    pub fn new(transport: &'a dyn Transport, config: &DiscoveryConfig) -> Self {
        Self {
            transport,
            config: config.clone(),
        }
    }

    /// Discover menu sources reachable from `base_url`.
    ///
    /// Returns an empty list when the page cannot be fetched, answers with a
    /// non-2xx status, or is not HTML. Each URL appears at most once.
    pub async fn discover(&self, base_url: &str) -> Vec<MenuSourceCandidate> {
        match self.try_discover(base_url).await {
            Ok(candidates) => candidates,
            Err(e) => {
                log::debug!("No menu links from {}: {}", base_url, e);
                Vec::new()
            }
        }
    }

    async fn try_discover(&self, base_url: &str) -> Result<Vec<MenuSourceCandidate>> {
        let base = Url::parse(base_url)?;
        let html = fetch_html(self.transport, base_url).await?;
        Ok(self.candidates_in(&base, &html))
    }

    /// Menu candidates in an already fetched page, sorted by URL.
    pub fn candidates_in(&self, base: &Url, html: &str) -> Vec<MenuSourceCandidate> {
        let Ok(anchors) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let document = Html::parse_document(html);
        let mut found: BTreeMap<String, SourceKind> = BTreeMap::new();

        for anchor in document.select(&anchors) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(url) = normalize_url(base, href) else {
                continue;
            };

            let text = anchor.text().collect::<String>();
            if !looks_like_menu(text.trim(), href, &self.config.hint_words) {
                continue;
            }

            let url = String::from(url);
            let kind = classify(&url);
            found.entry(url).or_insert(kind);
        }

        // Menus printed straight on the landing page
        if PRICE_PATTERN.is_match(&self.page_text(&document)) {
            let mut page = base.clone();
            page.set_fragment(None);
            found.entry(page.into()).or_insert(SourceKind::Page);
        }

        log::debug!("Found {} menu candidates on {}", found.len(), base);

        found
            .into_iter()
            .map(|(url, kind)| MenuSourceCandidate { url, kind })
            .collect()
    }

    /// Leading visible page text, capped at the configured number of
    /// characters.
    fn page_text(&self, document: &Html) -> String {
        document
            .root_element()
            .descendants()
            .filter_map(|node| node.value().as_text().map(|text| (node, text)))
            .filter(|(node, _)| {
                !node
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|element| is_hidden(element.value().name()))
            })
            .map(|(_, text)| &**text)
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(self.config.body_scan_chars)
            .collect()
    }
}

/// Elements whose text is never rendered.
fn is_hidden(name: &str) -> bool {
    matches!(name, "script" | "style" | "template" | "noscript")
}
