use crate::index::MetadataTable;
use crate::ranker::MatchResult;
use scraper::Html;
use serde::Serialize;

/// One link of a result's location trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub label: String,
    /// Cumulative path up to and including this segment, with a trailing slash.
    pub href: String,
}

/// A match resolved to everything needed to display it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    #[serde(rename = "ref")]
    pub reference: String,
    pub score: f64,
    pub href: String,
    pub title: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub tags: Vec<String>,
    pub last_mod: String,
    pub last_mod_date: String,
    /// Plain text; absent when the document has no description.
    pub description: Option<String>,
    /// Plain text.
    pub excerpt: String,
}

/// `base_href` joined with `reference`, dropping one leading slash from the ref.
pub fn href_for(base_href: &str, reference: &str) -> String {
    let reference = reference.strip_prefix('/').unwrap_or(reference);
    format!("{base_href}{reference}")
}

/// Every path segment of `href` except the last one.
pub fn breadcrumbs(href: &str) -> Vec<Breadcrumb> {
    let segments: Vec<&str> = href.split('/').collect();
    let parents = &segments[..segments.len() - 1];
    let mut trail = String::new();
    parents
        .iter()
        .map(|segment| {
            trail.push_str(segment);
            trail.push('/');
            Breadcrumb { label: segment.to_string(), href: trail.clone() }
        })
        .collect()
}

/// Text content of a markup fragment: tags dropped, entities decoded.
pub fn plain_text(markup: &str) -> String {
    if !markup.contains(['<', '&']) {
        return markup.to_string();
    }
    let fragment = Html::parse_fragment(markup);
    fragment.root_element().text().collect()
}

/// First ten characters of a timestamp, i.e. its `YYYY-MM-DD` part.
fn date_part(last_mod: &str) -> String {
    last_mod.chars().take(10).collect()
}

/// Resolve matches against the metadata table, preserving their order.
/// A match whose ref has no metadata is logged and left out.
pub fn project(matches: &[MatchResult], metadata: &MetadataTable, base_href: &str) -> Vec<ResultRecord> {
    let mut records = Vec::with_capacity(matches.len());
    for m in matches {
        let Some(meta) = metadata.get(&m.reference) else {
            tracing::warn!(reference = %m.reference, "no metadata for matched document");
            continue;
        };
        let href = href_for(base_href, &m.reference);
        let description = plain_text(&meta.description);
        records.push(ResultRecord {
            reference: m.reference.clone(),
            score: m.score,
            breadcrumbs: breadcrumbs(&href),
            href,
            title: meta.title.clone(),
            tags: meta.tags.clone(),
            last_mod: meta.last_mod.clone(),
            last_mod_date: date_part(&meta.last_mod),
            description: if description.is_empty() { None } else { Some(description) },
            excerpt: plain_text(&meta.excerpt),
        });
    }
    records
}
