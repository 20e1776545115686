// src/services/render.rs
// DOCUMENTATION: HTML rendering of the drop zone page
// PURPOSE: Turn photo records into gallery <img> elements

use crate::models::{DropStatus, Photo};

const PAGE_TEMPLATE: &str = include_str!("../../static/index.html");

/// Escape text for use in HTML content and quoted attributes
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// One <img> per record, in the given order
pub fn render_gallery(photos: &[Photo]) -> String {
    photos
        .iter()
        .map(|photo| {
            format!(
                r#"<img class="gallery-image" src="{}" alt="{}">"#,
                escape_html(&photo.url),
                escape_html(&photo.name)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full page: drop zone with its idle text and the gallery
pub fn render_page(photos: &[Photo]) -> String {
    PAGE_TEMPLATE
        .replace("{{status}}", &escape_html(&DropStatus::Idle.to_string()))
        .replace("{{gallery}}", &render_gallery(photos))
}
