//! Keyword search across every listing kind, blog posts and categories
//!
//! Each source is filtered independently with plain substring matching and
//! the hits are grouped by source key. There is no relevance ranking: hits
//! keep the newest-first order of their source.

use crate::db::repositories::{BlogPostRepository, CategoryRepository, ListingRepository};
use crate::models::{ListingFilter, ListingKind, ListingSection};
use anyhow::Context;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const DEFAULT_LIMIT: i64 = 8;
pub const MAX_LIMIT: i64 = 50;
const MIN_QUERY_CHARS: usize = 2;
const SNIPPET_CHARS: usize = 140;

#[derive(Debug, thiserror::Error)]
pub enum SearchServiceError {
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Query string of `GET /api/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
    pub mode: Option<String>,
    /// Comma separated group keys or kind slugs
    pub sources: Option<String>,
    /// Section slug such as `real-estate-property`
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// At least one word must occur
    Any,
    /// Every word must occur
    All,
}

impl MatchMode {
    pub fn parse(mode: Option<&str>) -> Self {
        match mode.map(|m| m.trim().to_lowercase()).as_deref() {
            Some("all") | Some("and") => MatchMode::All,
            _ => MatchMode::Any,
        }
    }
}

/// One searchable group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSource {
    Listings(ListingKind),
    BlogPosts,
    Categories,
    Subcategories,
}

impl SearchSource {
    pub fn all() -> Vec<SearchSource> {
        ListingKind::ALL
            .into_iter()
            .map(SearchSource::Listings)
            .chain([
                SearchSource::BlogPosts,
                SearchSource::Categories,
                SearchSource::Subcategories,
            ])
            .collect()
    }

    pub fn key(&self) -> &'static str {
        match self {
            SearchSource::Listings(kind) => kind.search_group(),
            SearchSource::BlogPosts => "blogPosts",
            SearchSource::Categories => "categories",
            SearchSource::Subcategories => "subcategories",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchSource::Listings(kind) => kind.label(),
            SearchSource::BlogPosts => "Blog Posts",
            SearchSource::Categories => "Categories",
            SearchSource::Subcategories => "Subcategories",
        }
    }

    /// Accepts a group key or a listing kind slug
    pub fn lookup(name: &str) -> Option<SearchSource> {
        let name = name.trim();
        if let Some(kind) = ListingKind::from_search_group(name) {
            return Some(SearchSource::Listings(kind));
        }
        if let Ok(kind) = name.parse::<ListingKind>() {
            return Some(SearchSource::Listings(kind));
        }
        [
            SearchSource::BlogPosts,
            SearchSource::Categories,
            SearchSource::Subcategories,
        ]
        .into_iter()
        .find(|source| source.key() == name)
    }
}

/// Entry of `GET /api/search/sources`
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ListingKind>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: i64,
    pub title: String,
    pub snippet: String,
    pub matched_words: Vec<String>,
    pub raw: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub q: String,
    pub results: BTreeMap<String, Vec<SearchHit>>,
}

impl SearchResponse {
    fn empty(q: String) -> Self {
        Self {
            q,
            results: BTreeMap::new(),
        }
    }
}

pub struct SearchService {
    listing_repo: Arc<dyn ListingRepository>,
    blog_repo: Arc<dyn BlogPostRepository>,
    category_repo: Arc<dyn CategoryRepository>,
}

impl SearchService {
    pub fn new(
        listing_repo: Arc<dyn ListingRepository>,
        blog_repo: Arc<dyn BlogPostRepository>,
        category_repo: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            listing_repo,
            blog_repo,
            category_repo,
        }
    }

    /// Every group a query may target
    pub fn sources(&self) -> Vec<SourceInfo> {
        SearchSource::all()
            .into_iter()
            .map(|source| {
                let kind = match source {
                    SearchSource::Listings(kind) => Some(kind),
                    _ => None,
                };
                SourceInfo {
                    key: source.key(),
                    label: source.label(),
                    section: kind.map(|k| k.section().as_str()),
                    kind,
                }
            })
            .collect()
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchServiceError> {
        let q = query.q.trim().to_string();
        if q.chars().count() < MIN_QUERY_CHARS {
            return Ok(SearchResponse::empty(q));
        }

        let words = query_words(&q);
        let mode = MatchMode::parse(query.mode.as_deref());
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize;
        let sources = select_sources(query.sources.as_deref(), query.category.as_deref());

        let words = &words;
        let searches = sources.into_iter().map(|source| async move {
            let hits = self.search_source(source, words, mode, limit).await?;
            Ok::<_, SearchServiceError>((source, hits))
        });

        let mut results = BTreeMap::new();
        for (source, hits) in try_join_all(searches).await? {
            if !hits.is_empty() {
                results.insert(source.key().to_string(), hits);
            }
        }

        tracing::debug!(q = %q, groups = results.len(), "search finished");
        Ok(SearchResponse { q, results })
    }

    async fn search_source(
        &self,
        source: SearchSource,
        words: &[String],
        mode: MatchMode,
        limit: usize,
    ) -> Result<Vec<SearchHit>, SearchServiceError> {
        let mut hits = Vec::new();
        match source {
            SearchSource::Listings(kind) => {
                let filter = ListingFilter {
                    is_active: Some(true),
                    ..ListingFilter::default()
                };
                let listings = self
                    .listing_repo
                    .list(Some(kind), &filter)
                    .await
                    .with_context(|| format!("Failed to search {}", kind))?;
                for listing in listings {
                    let fields = listing.searchable_text();
                    if let Some(matched) = match_words(&fields, words, mode) {
                        let body = listing.description.as_deref().unwrap_or(&listing.title);
                        hits.push(SearchHit {
                            id: listing.id,
                            title: listing.title.clone(),
                            snippet: snippet(body, &matched),
                            matched_words: matched,
                            raw: to_raw(&listing)?,
                        });
                        if hits.len() >= limit {
                            break;
                        }
                    }
                }
            }
            SearchSource::BlogPosts => {
                let posts = self
                    .blog_repo
                    .list(true, None)
                    .await
                    .context("Failed to search blog posts")?;
                for post in posts {
                    let fields = post.searchable_text();
                    if let Some(matched) = match_words(&fields, words, mode) {
                        let body = post.excerpt.as_deref().unwrap_or(&post.content);
                        hits.push(SearchHit {
                            id: post.id,
                            title: post.title.clone(),
                            snippet: snippet(body, &matched),
                            matched_words: matched,
                            raw: to_raw(&post)?,
                        });
                        if hits.len() >= limit {
                            break;
                        }
                    }
                }
            }
            SearchSource::Categories => {
                let mut categories = self
                    .category_repo
                    .list(true)
                    .await
                    .context("Failed to search categories")?;
                categories.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
                for category in categories {
                    let fields = named_fields(&category.name, &category.slug, category.description.as_deref());
                    if let Some(matched) = match_words(&fields, words, mode) {
                        let body = category.description.as_deref().unwrap_or(&category.name);
                        hits.push(SearchHit {
                            id: category.id,
                            title: category.name.clone(),
                            snippet: snippet(body, &matched),
                            matched_words: matched,
                            raw: to_raw(&category)?,
                        });
                        if hits.len() >= limit {
                            break;
                        }
                    }
                }
            }
            SearchSource::Subcategories => {
                let mut subcategories = self
                    .category_repo
                    .list_subcategories(true)
                    .await
                    .context("Failed to search subcategories")?;
                subcategories.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
                for sub in subcategories {
                    let fields = named_fields(&sub.name, &sub.slug, sub.description.as_deref());
                    if let Some(matched) = match_words(&fields, words, mode) {
                        let body = sub.description.as_deref().unwrap_or(&sub.name);
                        hits.push(SearchHit {
                            id: sub.id,
                            title: sub.name.clone(),
                            snippet: snippet(body, &matched),
                            matched_words: matched,
                            raw: to_raw(&sub)?,
                        });
                        if hits.len() >= limit {
                            break;
                        }
                    }
                }
            }
        }
        Ok(hits)
    }
}

fn to_raw<T: Serialize>(record: &T) -> Result<Value, SearchServiceError> {
    Ok(serde_json::to_value(record).context("Failed to serialize search hit")?)
}

fn named_fields<'a>(name: &str, slug: &str, description: Option<&str>) -> Vec<(&'a str, String)> {
    let mut fields = vec![("name", name.to_string()), ("slug", slug.to_string())];
    if let Some(description) = description {
        fields.push(("description", description.to_string()));
    }
    fields
}

/// Resolve `sources` and `category` into the groups to query
///
/// Unknown source names are skipped; if none is valid nothing is searched.
/// An unknown section leaves the selection unchanged.
pub fn select_sources(sources: Option<&str>, section: Option<&str>) -> Vec<SearchSource> {
    let mut selected = match sources.map(str::trim).filter(|s| !s.is_empty()) {
        Some(list) => {
            let requested: Vec<SearchSource> =
                list.split(',').filter_map(SearchSource::lookup).collect();
            SearchSource::all()
                .into_iter()
                .filter(|source| requested.contains(source))
                .collect()
        }
        None => SearchSource::all(),
    };

    if let Some(section) = section.and_then(|s| ListingSection::from_str(s.trim())) {
        selected.retain(|source| {
            matches!(source, SearchSource::Listings(kind) if kind.section() == section)
        });
    }
    selected
}

/// Lowercase `c` to a single char so char positions line up with the input
fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn fold(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

/// Distinct lowercase words in query order
pub fn query_words(q: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in fold(q).split_whitespace() {
        if !words.iter().any(|w| w == word) {
            words.push(word.to_string());
        }
    }
    words
}

/// The query words found in `fields`, or `None` when the record doesn't match
pub fn match_words(fields: &[(&str, String)], words: &[String], mode: MatchMode) -> Option<Vec<String>> {
    let haystacks: Vec<String> = fields.iter().map(|(_, text)| fold(text)).collect();
    let matched: Vec<String> = words
        .iter()
        .filter(|word| haystacks.iter().any(|h| h.contains(word.as_str())))
        .cloned()
        .collect();

    let hit = match mode {
        MatchMode::Any => !matched.is_empty(),
        MatchMode::All => !words.is_empty() && matched.len() == words.len(),
    };
    hit.then_some(matched)
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// About 140 characters of `text` around the first matched word
///
/// Falls back to the start of the text when no word occurs in it.
pub fn snippet(text: &str, words: &[String]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let folded: Vec<char> = chars.iter().copied().map(fold_char).collect();

    let first = words
        .iter()
        .filter_map(|word| {
            let needle: Vec<char> = word.chars().collect();
            find_chars(&folded, &needle)
        })
        .min();

    let start = match first {
        Some(pos) if chars.len() > SNIPPET_CHARS => pos
            .saturating_sub(SNIPPET_CHARS / 3)
            .min(chars.len() - SNIPPET_CHARS),
        _ => 0,
    };
    let end = (start + SNIPPET_CHARS).min(chars.len());

    let mut out: String = chars[start..end].iter().collect();
    out = out.trim().to_string();
    if start > 0 {
        out.insert_str(0, "...");
    }
    if end < chars.len() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxBlogPostRepository, SqlxCategoryRepository, SqlxListingRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::Listing;
    use chrono::Utc;
    use proptest::prelude::*;
    use serde_json::json;

    struct Fixture {
        service: SearchService,
        listings: Arc<dyn ListingRepository>,
    }

    async fn setup_test_service() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let listings = SqlxListingRepository::boxed(pool.clone());
        let service = SearchService::new(
            listings.clone(),
            SqlxBlogPostRepository::boxed(pool.clone()),
            SqlxCategoryRepository::boxed(pool),
        );
        Fixture { service, listings }
    }

    fn listing(kind: ListingKind, title: &str, description: &str) -> Listing {
        let now = Utc::now();
        Listing {
            id: 0,
            kind,
            title: title.to_string(),
            description: Some(description.to_string()),
            price: None,
            images: vec![],
            category: None,
            country: "India".to_string(),
            state: None,
            city: None,
            area: None,
            address: None,
            contact_name: None,
            contact_phone: None,
            contact_email: None,
            location_id: None,
            user_id: None,
            role: None,
            is_active: true,
            is_featured: false,
            view_count: 0,
            attributes: serde_json::Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn query(q: &str) -> SearchQuery {
        SearchQuery {
            q: q.to_string(),
            ..SearchQuery::default()
        }
    }

    #[tokio::test]
    async fn test_short_query_returns_empty() {
        let fx = setup_test_service().await;
        let response = fx.service.search(&query(" a ")).await.unwrap();
        assert_eq!(response.q, "a");
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn test_matches_title_and_description_across_kinds() {
        let fx = setup_test_service().await;
        fx.listings
            .create(&listing(ListingKind::RentalListings, "Sunny 2BHK", "Flat in Kothrud"))
            .await
            .unwrap();
        fx.listings
            .create(&listing(ListingKind::HostelPg, "Girls PG", "Near Kothrud bus stand"))
            .await
            .unwrap();
        fx.listings
            .create(&listing(ListingKind::CarsBikes, "Swift", "Diesel, single owner"))
            .await
            .unwrap();

        let response = fx.service.search(&query("kothrud")).await.unwrap();
        assert_eq!(response.results.len(), 2);
        let rentals = &response.results["rentalListings"];
        assert_eq!(rentals[0].title, "Sunny 2BHK");
        assert_eq!(rentals[0].matched_words, vec!["kothrud"]);
        assert!(rentals[0].snippet.contains("Kothrud"));
        assert_eq!(rentals[0].raw["kind"], json!("rental-listings"));
        assert!(response.results.contains_key("hostelPg"));
    }

    #[tokio::test]
    async fn test_all_mode_requires_every_word() {
        let fx = setup_test_service().await;
        fx.listings
            .create(&listing(ListingKind::RentalListings, "2BHK Baner", "furnished"))
            .await
            .unwrap();
        fx.listings
            .create(&listing(ListingKind::RentalListings, "1RK Baner", "unfurnished"))
            .await
            .unwrap();
        fx.listings
            .create(&listing(ListingKind::RentalListings, "Studio Aundh", "furnished"))
            .await
            .unwrap();

        let any = fx.service.search(&query("baner 2bhk")).await.unwrap();
        assert_eq!(any.results["rentalListings"].len(), 2);

        let all = fx
            .service
            .search(&SearchQuery {
                mode: Some("and".to_string()),
                ..query("baner 2bhk")
            })
            .await
            .unwrap();
        assert_eq!(all.results["rentalListings"].len(), 1);
        assert_eq!(all.results["rentalListings"][0].title, "2BHK Baner");
    }

    #[tokio::test]
    async fn test_inactive_listings_are_hidden() {
        let fx = setup_test_service().await;
        let mut hidden = listing(ListingKind::Showrooms, "Maruti showroom", "");
        hidden.is_active = false;
        fx.listings.create(&hidden).await.unwrap();

        let response = fx.service.search(&query("maruti")).await.unwrap();
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn test_limit_and_newest_first() {
        let fx = setup_test_service().await;
        for i in 0..4 {
            fx.listings
                .create(&listing(ListingKind::LanguageClasses, &format!("German batch {}", i), ""))
                .await
                .unwrap();
        }
        let response = fx
            .service
            .search(&SearchQuery {
                limit: Some(2),
                ..query("german")
            })
            .await
            .unwrap();
        let titles: Vec<&str> = response.results["languageClasses"]
            .iter()
            .map(|h| h.title.as_str())
            .collect();
        assert_eq!(titles, vec!["German batch 3", "German batch 2"]);
    }

    #[tokio::test]
    async fn test_sources_and_section_filters() {
        let fx = setup_test_service().await;
        fx.listings
            .create(&listing(ListingKind::RentalListings, "Pune flat", ""))
            .await
            .unwrap();
        fx.listings
            .create(&listing(ListingKind::TuitionPrivateClasses, "Pune maths tuition", ""))
            .await
            .unwrap();

        let only_tuition = fx
            .service
            .search(&SearchQuery {
                sources: Some("tuition, bogus".to_string()),
                ..query("pune")
            })
            .await
            .unwrap();
        assert_eq!(only_tuition.results.keys().collect::<Vec<_>>(), vec!["tuition"]);

        let by_slug = fx
            .service
            .search(&SearchQuery {
                sources: Some("rental-listings".to_string()),
                ..query("pune")
            })
            .await
            .unwrap();
        assert_eq!(by_slug.results.keys().collect::<Vec<_>>(), vec!["rentalListings"]);

        let nothing_valid = fx
            .service
            .search(&SearchQuery {
                sources: Some("bogus".to_string()),
                ..query("pune")
            })
            .await
            .unwrap();
        assert!(nothing_valid.results.is_empty());

        let by_section = fx
            .service
            .search(&SearchQuery {
                category: Some("education-learning".to_string()),
                ..query("pune")
            })
            .await
            .unwrap();
        assert_eq!(by_section.results.keys().collect::<Vec<_>>(), vec!["tuition"]);
    }

    #[test]
    fn test_select_sources_defaults_to_everything() {
        let all = select_sources(None, None);
        assert_eq!(all.len(), ListingKind::ALL.len() + 3);
        assert_eq!(select_sources(None, Some("no-such-section")).len(), all.len());
        assert_eq!(
            select_sources(Some("blogPosts,categories"), None),
            vec![SearchSource::BlogPosts, SearchSource::Categories]
        );
    }

    #[test]
    fn test_sources_listing() {
        let sources = SearchSource::all();
        assert!(sources.iter().any(|s| s.key() == "cars"));
        assert_eq!(SearchSource::lookup("cars-bikes"), Some(SearchSource::Listings(ListingKind::CarsBikes)));
        assert_eq!(SearchSource::lookup("subcategories"), Some(SearchSource::Subcategories));
        assert_eq!(SearchSource::lookup("nope"), None);
    }

    #[test]
    fn test_query_words_are_distinct_and_lowercase() {
        assert_eq!(query_words("Pune  PUNE flat"), vec!["pune", "flat"]);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(MatchMode::parse(None), MatchMode::Any);
        assert_eq!(MatchMode::parse(Some("ALL")), MatchMode::All);
        assert_eq!(MatchMode::parse(Some("and")), MatchMode::All);
        assert_eq!(MatchMode::parse(Some("whatever")), MatchMode::Any);
    }

    #[test]
    fn test_snippet_windows_around_match() {
        let text = format!("{} Kothrud {}", "x".repeat(200), "y".repeat(200));
        let s = snippet(&text, &["kothrud".to_string()]);
        assert!(s.contains("Kothrud"));
        assert!(s.starts_with("..."));
        assert!(s.ends_with("..."));
        assert!(s.chars().count() <= SNIPPET_CHARS + 6);

        assert_eq!(snippet("Short text", &["zzz".to_string()]), "Short text");
    }

    #[test]
    fn test_snippet_handles_multibyte_text() {
        let text = format!("{}Café near İstanbul road{}", "é".repeat(150), "ü".repeat(150));
        let s = snippet(&text, &["istanbul".to_string(), "road".to_string()]);
        assert!(s.contains("road"));
    }

    proptest! {
        #[test]
        fn prop_substring_of_title_always_matches(
            title in "[a-zA-Z ]{2,40}",
            start in 0usize..40,
            len in 2usize..10,
        ) {
            let lower = title.to_lowercase();
            let start = start.min(lower.len().saturating_sub(2));
            let end = (start + len).min(lower.len());
            let word = lower[start..end].trim().to_string();
            prop_assume!(word.len() >= 2 && !word.contains(' '));

            let fields = vec![("title", title.clone())];
            let words = vec![word.clone()];
            prop_assert_eq!(match_words(&fields, &words, MatchMode::Any), Some(words.clone()));
            prop_assert_eq!(match_words(&fields, &words, MatchMode::All), Some(words));
        }

        #[test]
        fn prop_all_mode_is_stricter_than_any(
            text in "[a-z ]{0,30}",
            words in proptest::collection::vec("[a-z]{1,4}", 1..4),
        ) {
            let fields = vec![("description", text)];
            if match_words(&fields, &words, MatchMode::All).is_some() {
                prop_assert!(match_words(&fields, &words, MatchMode::Any).is_some());
            }
        }
    }
}
