//! HTML fragment for the results popover.
//!
//! Every piece of document data is escaped. The only attribute carrying
//! computed content is `style` on the two wrapper elements.

use offsearch_core::{Popover, ResultRecord};
use std::fmt::Write;

/// Fixed part of the result-body height budget, in pixels.
const HEIGHT_ALLOWANCE_PX: f64 = 180.0;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Links are only emitted for relative paths and http(s) URLs.
fn safe_href(href: &str) -> String {
    let lower = href.trim_start().to_ascii_lowercase();
    let scheme = lower.split_once(':').map(|(s, _)| s).filter(|s| !s.contains('/'));
    match scheme {
        None | Some("http") | Some("https") => escape_html(href),
        Some(_) => "#".to_string(),
    }
}

/// `anchor_offset` is the distance in pixels from the viewport top to the
/// search input. Returns `None` when the popover should not be shown.
pub fn render_popover(popover: &Popover, anchor_offset: f64) -> Option<String> {
    let body = match popover {
        Popover::Hidden => return None,
        Popover::NoResults { message, .. } => format!("<p>{}</p>", escape_html(message)),
        Popover::Results { results, .. } => results.iter().map(render_card).collect(),
    };

    let offset = if anchor_offset.is_finite() { anchor_offset.max(0.0) } else { 0.0 };
    let mut html = String::new();
    html.push_str("<div class=\"offline-search-result\">");
    html.push_str("<div style=\"display: flex; justify-content: space-between; margin-bottom: 0\">");
    html.push_str("<span class=\"search-result-title\"></span>");
    html.push_str("<i class=\"fas fa-times search-result-close-button\"></i>");
    html.push_str("</div>");
    let _ = write!(
        html,
        "<div style=\"max-height: calc(100vh - {}px); min-height: 150px; overflow-y: auto\">",
        offset + HEIGHT_ALLOWANCE_PX
    );
    html.push_str(&body);
    html.push_str("</div></div>");
    Some(html)
}

fn render_card(r: &ResultRecord) -> String {
    let mut html = String::new();
    html.push_str("<div class=\"card\"><div class=\"card-header\">");
    let _ = write!(html, "<a class=\"search-result-link\" href=\"{}\">{}</a>", safe_href(&r.href), escape_html(&r.title));
    let _ = write!(html, "<span class=\"last-mod\">{}</span>", escape_html(&r.last_mod_date));
    html.push_str("<i class=\"fa fa-edit last-mod\"></i>");

    html.push_str("<div class=\"card-header-context\"><div class=\"breadcrumbs\">");
    for (i, crumb) in r.breadcrumbs.iter().enumerate() {
        if i > 0 {
            html.push_str("<span class=\"search-breadcrumb\">/</span>");
        }
        let _ = write!(
            html,
            "<a class=\"search-breadcrumb\" href=\"{}\">{}</a>",
            safe_href(&crumb.href),
            escape_html(&crumb.label)
        );
    }
    html.push_str("</div><div class=\"tags\">");
    for tag in &r.tags {
        let _ = write!(html, "<span class=\"tag label label-default\">#{}</span>", escape_html(tag));
    }
    html.push_str("</div></div></div>");

    html.push_str("<div class=\"card-body\">");
    if let Some(description) = &r.description {
        let _ = write!(html, "<p class=\"card-text description\">{}</p>", escape_html(description));
    }
    let _ = write!(html, "<p class=\"card-text text-muted\">{}</p>", escape_html(&r.excerpt));
    html.push_str("</div></div>");
    html
}
