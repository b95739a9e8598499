use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::models::Anchor;

/// Hidden fields and target of an HTML login form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub action: Option<String>,
    pub hidden_fields: Vec<(String, String)>,
}

fn selector(css: &str) -> Selector {
    // Only called with literal selectors below.
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<Vec<_>>().join("\n")
}

/// All links whose href contains `fragment`, in document order.
pub fn anchors_containing(html: &str, fragment: &str) -> Vec<Anchor> {
    let document = Html::parse_document(html);
    let link_selector = selector("a[href]");

    document
        .select(&link_selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            if !href.contains(fragment) {
                return None;
            }
            Some(Anchor {
                href: href.to_string(),
                text: element_text(&element),
            })
        })
        .collect()
}

/// First non-blank line of a link's text, which is how listing cards lead with their title.
pub fn title_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Make `href` absolute against `origin` (scheme and host, no trailing slash).
pub fn resolve_url(href: &str, origin: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("{}{}", origin, href)
    } else {
        format!("{}/{}", origin, href)
    }
}

/// Listing URL without query string or fragment, so tracking parameters don't change its identity.
pub fn canonical_url(url: &str) -> String {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].to_string()
}

/// Text nodes matching `pattern`, trimmed, in document order. Script and style bodies are ignored.
pub fn texts_matching(html: &str, pattern: &Regex) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut found = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_code = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|e| e.name().to_string()))
            .is_some_and(|name| name == "script" || name == "style");
        if in_code {
            continue;
        }

        let text = text.trim();
        if !text.is_empty() && pattern.is_match(text) {
            found.push(text.to_string());
        }
    }

    found
}

/// The first form on the page that asks for an `email` field.
pub fn login_form(html: &str) -> Option<LoginForm> {
    let document = Html::parse_document(html);
    let form_selector = selector("form");
    let email_selector = selector("input[name='email']");
    let hidden_selector = selector("input[type='hidden'][name]");

    let form = document
        .select(&form_selector)
        .find(|form| form.select(&email_selector).next().is_some())?;

    let hidden_fields = form
        .select(&hidden_selector)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect();

    Some(LoginForm {
        action: form.value().attr("action").map(str::to_string),
        hidden_fields,
    })
}
