//! Article page fixtures in the list endpoint's wire format

use serde_json::{Value, json};

/// Total articles in the default fixture set
pub const TOTAL_ARTICLES: u64 = 42;

/// One article as the API returns it
pub fn article_json(category: &str, page: u32, index: usize) -> Value {
    json!({
        "_id": format!("{category}-{page}-{index}"),
        "title": format!("{category} story {page}.{index}"),
        "link_url": format!("https://news.example.com/{category}/{page}/{index}"),
        "location": "Hà Nội",
        "datetime": "2024-05-01T08:00:00",
        "summary": format!("Summary of {category} story {page}.{index}"),
        "image_url": format!("https://img.example.com/{category}/{page}/{index}.jpg"),
        "category": category,
        "created_at": "2024-05-01T08:05:00"
    })
}

/// A full page envelope with `size` articles
pub fn page_json(category: &str, page: u32, size: u32, total: u64) -> Value {
    let pages = total.div_ceil(u64::from(size));
    let remaining = total.saturating_sub(u64::from(page - 1) * u64::from(size));
    let count = remaining.min(u64::from(size)) as usize;

    json!({
        "items": (0..count)
            .map(|i| article_json(category, page, i))
            .collect::<Vec<_>>(),
        "total": total,
        "page": page,
        "size": size,
        "pages": pages
    })
}

/// Article without optional fields, to exercise display fallbacks
pub fn sparse_article_json() -> Value {
    json!({
        "title": "Bare story",
        "link_url": "https://news.example.com/bare",
        "created_at": "2024-05-02T10:00:00"
    })
}
