// Signals read from a fetched HTML page.

use scraper::{Html, Selector};

/// Substrings found in script/link/meta attributes and the technology they
/// reveal. Checked in order; a name is reported once.
const SIGNATURES: &[(&str, &str)] = &[
    ("wp-content", "WordPress"),
    ("wp-includes", "WordPress"),
    ("cdn.shopify.com", "Shopify"),
    ("static.squarespace.com", "Squarespace"),
    ("squarespace-cdn.com", "Squarespace"),
    ("static.wixstatic.com", "Wix"),
    ("parastorage.com", "Wix"),
    ("webflow", "Webflow"),
    ("godaddy", "GoDaddy Website Builder"),
    ("jquery", "jQuery"),
    ("bootstrap", "Bootstrap"),
    ("googletagmanager.com", "Google Tag Manager"),
    ("google-analytics.com", "Google Analytics"),
    ("gtag/js", "Google Analytics"),
    ("fonts.googleapis.com", "Google Fonts"),
    ("connect.facebook.net", "Facebook Pixel"),
];

#[derive(Debug, Default, PartialEq)]
pub struct PageSignals {
    pub mobile_friendly: bool,
    pub has_contact_form: bool,
    pub has_email: bool,
    pub technologies: Vec<String>,
}

pub fn parse_page(html: &str) -> PageSignals {
    let document = Html::parse_document(html);

    let mobile_friendly = select_first(&document, r#"meta[name="viewport"]"#).is_some();
    let has_contact_form = select_first(&document, "form").is_some();
    let has_email = select_first(&document, r#"a[href^="mailto:"]"#).is_some();

    let mut technologies = Vec::new();
    let mut push = |name: &str| {
        if !technologies.iter().any(|t| t == name) {
            technologies.push(name.to_string());
        }
    };

    if let Some(generator) = select_first(&document, r#"meta[name="generator"]"#)
        .and_then(|el| el.value().attr("content"))
    {
        // "WordPress 6.4.2" -> "WordPress"
        if let Some(name) = generator.split_whitespace().next() {
            push(name);
        }
    }

    if let Ok(selector) = Selector::parse("script[src], link[href]") {
        for el in document.select(&selector) {
            let attr = el
                .value()
                .attr("src")
                .or_else(|| el.value().attr("href"))
                .unwrap_or_default()
                .to_ascii_lowercase();
            for (needle, name) in SIGNATURES {
                if attr.contains(*needle) {
                    push(*name);
                }
            }
        }
    }

    PageSignals {
        mobile_friendly,
        has_contact_form,
        has_email,
        technologies,
    }
}

/// Maps an `X-Powered-By` header value to a technology name.
/// "PHP/8.1.2" -> "PHP", "Express" -> "Express".
pub fn powered_by(header: &str) -> Option<String> {
    header
        .split(|c: char| c == '/' || c == ',' || c.is_whitespace())
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn select_first<'a>(document: &'a Html, css: &str) -> Option<scraper::ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}
