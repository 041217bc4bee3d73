//! Core types for news-pager

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display fallback for articles without a location
pub const LOCATION_FALLBACK: &str = "Không có";

/// Filter and pagination selection driving one fetch
///
/// Two `FilterParams` that differ only in `page` describe the same query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Category name, omitted from the query when `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Free-text search, sent as `q`
    #[serde(default, rename = "q", skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
    /// 1-based page number
    pub page: u32,
    /// Items per page, sent as `size`
    #[serde(rename = "size")]
    pub page_size: u32,
}

impl FilterParams {
    /// First page of an unfiltered query
    pub fn new(page_size: u32) -> Self {
        Self {
            category: None,
            search_text: None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Set the category
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the search text
    #[must_use]
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Same query, different page
    #[must_use]
    pub fn at_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    /// Apply a partial update; any change other than the page resets to page 1
    #[must_use]
    pub fn merged(&self, update: &FilterUpdate) -> Self {
        let mut next = self.clone();
        if let Some(category) = &update.category {
            next.category = category.clone().filter(|c| !c.is_empty());
        }
        if let Some(text) = &update.search_text {
            next.search_text = text.clone().filter(|t| !t.trim().is_empty());
        }
        if let Some(size) = update.page_size {
            next.page_size = size.max(1);
        }
        next.page = 1;
        next
    }

    /// True when both select the same query regardless of page
    pub fn same_query(&self, other: &FilterParams) -> bool {
        self.category == other.category
            && self.search_text == other.search_text
            && self.page_size == other.page_size
    }
}

/// Partial filter change passed to `update_filters`
///
/// `None` leaves a field untouched; `Some(None)` clears an optional filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    /// New category, or `Some(None)` to show every category
    pub category: Option<Option<String>>,
    /// New search text, or `Some(None)` to clear the search
    pub search_text: Option<Option<String>>,
    /// New page size
    pub page_size: Option<u32>,
}

impl FilterUpdate {
    /// Select a category
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(Some(category.into())),
            ..Default::default()
        }
    }

    /// Set the search text
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search_text: Some(Some(text.into())),
            ..Default::default()
        }
    }

    /// Drop category and search filters
    pub fn clear() -> Self {
        Self {
            category: Some(None),
            search_text: Some(None),
            page_size: None,
        }
    }
}

/// Raw article as returned by the list endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDto {
    /// Database identifier
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    /// Headline
    pub title: String,
    /// Link to the source article
    pub link_url: String,
    /// Place the story is about
    #[serde(default)]
    pub location: Option<String>,
    /// Publication time as published by the source
    #[serde(default)]
    pub datetime: Option<String>,
    /// AI-generated summary
    #[serde(default)]
    pub summary: Option<String>,
    /// Illustration URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Category name
    #[serde(default)]
    pub category: Option<String>,
    /// Full scraped content
    #[serde(default)]
    pub content: Option<String>,
    /// Time the article was stored
    #[serde(default)]
    pub created_at: Option<String>,
    /// Time the article was last updated
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Raw page envelope returned by the list endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticlePageDto {
    /// Articles on this page
    pub items: Vec<ArticleDto>,
    /// Total matching articles
    pub total: u64,
    /// Page number
    pub page: u32,
    /// Page size
    pub size: u32,
    /// Total page count
    pub pages: u32,
}

/// Display-ready article
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Headline
    pub title: String,
    /// Link to the source article
    pub link_url: String,
    /// Location, or [`LOCATION_FALLBACK`]
    pub location: String,
    /// Publication time, falling back to the storage time
    pub datetime: String,
    /// Illustration URL
    pub image_url: String,
    /// Category name
    pub category: String,
    /// Summary, empty when missing
    pub summary: String,
}

impl From<ArticleDto> for ArticleRecord {
    fn from(dto: ArticleDto) -> Self {
        Self {
            title: dto.title,
            link_url: dto.link_url,
            location: non_empty(dto.location).unwrap_or_else(|| LOCATION_FALLBACK.to_string()),
            datetime: non_empty(dto.datetime)
                .or_else(|| non_empty(dto.created_at))
                .unwrap_or_default(),
            image_url: dto.image_url.unwrap_or_default(),
            category: dto.category.unwrap_or_default(),
            summary: non_empty(dto.summary).unwrap_or_default(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// One page of display-ready articles plus pagination metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// Articles in server order
    pub items: Vec<ArticleRecord>,
    /// Total matching articles
    pub total_items: u64,
    /// Page number
    pub page_number: u32,
    /// Page size
    pub page_size: u32,
    /// Total page count (authoritative for "has more")
    pub total_pages: u32,
}

impl From<ArticlePageDto> for PageResult {
    fn from(dto: ArticlePageDto) -> Self {
        Self {
            items: dto.items.into_iter().map(ArticleRecord::from).collect(),
            total_items: dto.total,
            page_number: dto.page,
            page_size: dto.size,
            total_pages: dto.pages,
        }
    }
}

/// Health endpoint payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status reported by the server (e.g. "healthy")
    pub status: String,
}

/// Transient, dismissable message for the presentation layer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A fetch failed
    Error {
        /// Short title
        title: String,
        /// Error detail
        detail: String,
        /// When the notification was raised
        at: DateTime<Utc>,
    },
    /// A refresh succeeded
    Success {
        /// Short title
        title: String,
        /// Detail, including the number of articles fetched
        detail: String,
        /// When the notification was raised
        at: DateTime<Utc>,
    },
}

impl Notification {
    /// Error notification with the default title
    pub fn error(detail: impl Into<String>) -> Self {
        Notification::Error {
            title: "Lỗi".to_string(),
            detail: detail.into(),
            at: Utc::now(),
        }
    }

    /// Success notification for a refresh that fetched `count` articles
    pub fn refreshed(count: usize) -> Self {
        Notification::Success {
            title: "Thành công".to_string(),
            detail: format!("Đã tải {count} tin tức"),
            at: Utc::now(),
        }
    }

    /// Detail text
    pub fn detail(&self) -> &str {
        match self {
            Notification::Error { detail, .. } | Notification::Success { detail, .. } => detail,
        }
    }

    /// True for error notifications
    pub fn is_error(&self) -> bool {
        matches!(self, Notification::Error { .. })
    }
}

/// Abstract "request the next page" seam
///
/// Implemented by the pagination controller and called by the scroll trigger, so the
/// controller never depends on viewport concepts.
pub trait LoadMoreHandler: Send + Sync {
    /// Ask for the next page; must return immediately
    fn request_next_page(&self);
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> ArticleDto {
        ArticleDto {
            id: Some("507f1f77bcf86cd799439011".into()),
            title: "Mưa lớn ở Hà Nội".into(),
            link_url: "https://example.com/a".into(),
            location: None,
            datetime: None,
            summary: None,
            image_url: Some("https://example.com/a.jpg".into()),
            category: Some("thoi-su".into()),
            content: Some("...".into()),
            created_at: Some("2025-01-08T10:00:00".into()),
            updated_at: Some("2025-01-08T10:00:00".into()),
        }
    }

    #[test]
    fn test_record_applies_fallbacks() {
        let record = ArticleRecord::from(dto());
        assert_eq!(record.location, LOCATION_FALLBACK);
        assert_eq!(record.datetime, "2025-01-08T10:00:00");
        assert_eq!(record.summary, "");
        assert_eq!(record.category, "thoi-su");
    }

    #[test]
    fn test_record_keeps_present_values() {
        let mut raw = dto();
        raw.location = Some("Hà Nội".into());
        raw.datetime = Some("08/01/2025 09:00".into());
        raw.summary = Some("Tóm tắt".into());

        let record = ArticleRecord::from(raw);
        assert_eq!(record.location, "Hà Nội");
        assert_eq!(record.datetime, "08/01/2025 09:00");
        assert_eq!(record.summary, "Tóm tắt");
    }

    #[test]
    fn test_dto_deserializes_nulls() {
        let raw: ArticleDto = serde_json::from_str(
            r#"{"_id":"1","title":"t","link_url":"https://x","location":null,
                "datetime":null,"summary":null,"image_url":"https://x/i.png",
                "category":"c","content":"body","created_at":"2025-01-01T00:00:00",
                "updated_at":"2025-01-01T00:00:00"}"#,
        )
        .unwrap();
        assert_eq!(raw.id.as_deref(), Some("1"));
        assert!(raw.location.is_none());
        assert!(raw.summary.is_none());
    }

    #[test]
    fn test_merged_resets_page() {
        let params = FilterParams::new(6).with_category("sports").at_page(4);
        let next = params.merged(&FilterUpdate::search("bóng đá"));
        assert_eq!(next.page, 1);
        assert_eq!(next.category.as_deref(), Some("sports"));
        assert_eq!(next.search_text.as_deref(), Some("bóng đá"));
        assert!(!next.same_query(&params));
    }

    #[test]
    fn test_merged_clear_and_blank_values() {
        let params = FilterParams::new(6).with_category("sports").with_search("x");
        let cleared = params.merged(&FilterUpdate::clear());
        assert_eq!(cleared.category, None);
        assert_eq!(cleared.search_text, None);

        let blank = params.merged(&FilterUpdate::search("   "));
        assert_eq!(blank.search_text, None);
    }

    #[test]
    fn test_same_query_ignores_page() {
        let params = FilterParams::new(6).with_category("science");
        assert!(params.same_query(&params.at_page(3)));
    }

    #[test]
    fn test_refreshed_notification_counts() {
        let n = Notification::refreshed(6);
        assert_eq!(n.detail(), "Đã tải 6 tin tức");
        assert!(!n.is_error());
        assert!(Notification::error("db down").is_error());
    }
}
