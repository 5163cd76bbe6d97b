//! Scraper for the operator's line index page.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::domain::LineId;

use super::{LineRef, UNKNOWN_COLOUR};

static MODE_BLOCK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.type.uk-flex.uk-flex-middle").expect("valid mode block selector")
});
static MODE_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3.type").expect("valid mode title selector"));
static LINE_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href^="/en/lignes/"]"#).expect("valid line link selector")
});
static LINE_LOGO: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.line-logo").expect("valid line logo selector"));
static BACKGROUND_COLOUR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"background-color:\s*(#[0-9a-fA-F]{6});").expect("valid colour regex")
});

/// Extract line references from the line index page.
///
/// Lines are grouped under a mode heading; the group's lines sit in the
/// heading block's next sibling element, which carries the `lignes` class.
pub fn parse_index_page(html: &str, base_url: &str) -> Vec<LineRef> {
    let document = Html::parse_document(html);
    let base_url = base_url.trim_end_matches('/');
    let mut lines = Vec::new();

    for block in document.select(&MODE_BLOCK) {
        let Some(kind) = block.select(&MODE_TITLE).next().map(element_text) else {
            continue;
        };
        if kind.is_empty() {
            continue;
        }

        let Some(container) = block.next_siblings().find_map(ElementRef::wrap) else {
            continue;
        };
        if !container.value().classes().any(|c| c == "lignes") {
            continue;
        }

        for link in container.select(&LINE_LINK) {
            let Some(logo) = link.select(&LINE_LOGO).next() else {
                continue;
            };

            let text = element_text(logo);
            let number = match LineId::parse(&text) {
                Ok(number) => number,
                Err(e) => {
                    debug!(error = %e, "skipping line link");
                    continue;
                }
            };

            let colour = logo
                .value()
                .attr("style")
                .and_then(|style| BACKGROUND_COLOUR.captures(style))
                .map(|caps| caps[1].to_string())
                .unwrap_or_else(|| UNKNOWN_COLOUR.to_string());

            let href = link.value().attr("href").unwrap_or_default();

            lines.push(LineRef {
                number,
                kind: kind.clone(),
                colour,
                link: format!("{base_url}{href}"),
                name: None,
            });
        }
    }

    lines
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
