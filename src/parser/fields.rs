use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::avatar::normalize_avatar_url;
use super::dom::{first_match, sel, text_of, Finder};

static TITLE: LazyLock<Selector> = LazyLock::new(|| sel("title"));
static H1_PAGE_TITLE: LazyLock<Selector> = LazyLock::new(|| sel("h1.page-title"));
static H1: LazyLock<Selector> = LazyLock::new(|| sel("h1"));
static IMG_USER_LOGO: LazyLock<Selector> = LazyLock::new(|| sel("img.userLogo"));
static IMG_WITH_ALT: LazyLock<Selector> = LazyLock::new(|| sel("img[alt]"));
static LINK: LazyLock<Selector> = LazyLock::new(|| sel("a[href]"));
static USER_HOVER: LazyLock<Selector> = LazyLock::new(|| sel("span.user-hover"));

/// Skins differ on whether the profile heading carries `page-title`.
pub const HEADING_FINDERS: &[Finder] = &[
    Finder { name: "h1.page-title", find: heading_with_page_title },
    Finder { name: "first h1", find: first_heading },
];

pub const AVATAR_FINDERS: &[Finder] = &[
    Finder { name: "img.userLogo", find: user_logo_image },
    Finder { name: "img[alt*=Avatar]", find: avatar_alt_image },
];

fn heading_with_page_title(doc: &Html) -> Option<ElementRef<'_>> {
    doc.select(&H1_PAGE_TITLE).next()
}

fn first_heading(doc: &Html) -> Option<ElementRef<'_>> {
    doc.select(&H1).next()
}

fn user_logo_image(doc: &Html) -> Option<ElementRef<'_>> {
    doc.select(&IMG_USER_LOGO).next()
}

// Substring match is case-sensitive: "avatar" does not count.
fn avatar_alt_image(doc: &Html) -> Option<ElementRef<'_>> {
    doc.select(&IMG_WITH_ALT)
        .find(|img| img.value().attr("alt").is_some_and(|alt| alt.contains("Avatar")))
}

/// Scalar fields read straight off the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub page_title: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
}

pub fn extract(doc: &Html, base_url: &str) -> Fields {
    Fields {
        page_title: doc.select(&TITLE).next().map(text_of),
        full_name: first_match(doc, HEADING_FINDERS).map(text_of),
        avatar_url: avatar_url(doc, base_url),
        email: email(doc),
        username: username(doc),
    }
}

// A matched image without `src` yields nothing; the next finder is not tried.
fn avatar_url(doc: &Html, base_url: &str) -> Option<String> {
    let img = first_match(doc, AVATAR_FINDERS)?;
    let src = img.value().attr("src").filter(|s| !s.is_empty())?;
    Some(normalize_avatar_url(src, base_url))
}

fn email(doc: &Html) -> Option<String> {
    doc.select(&LINK)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.starts_with("mailto:"))
        .map(|href| href.replace("mailto:", ""))
}

fn username(doc: &Html) -> Option<String> {
    let el = doc.select(&USER_HOVER).next()?;
    match el.value().attr("data-username") {
        Some(name) if !name.is_empty() => Some(name.to_string()),
        _ => Some(text_of(el)),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://issues.example.org";

    fn fields(body: &str) -> Fields {
        let doc = Html::parse_document(&format!("<!DOCTYPE html><html>{body}</html>"));
        extract(&doc, BASE)
    }

    #[test]
    fn bare_page_has_no_fields() {
        assert_eq!(fields("<body><p>nothing here</p></body>"), Fields::default());
    }

    #[test]
    fn title_is_trimmed() {
        let f = fields("<head><title>\n  Profile: Jane Doe \n</title></head>");
        assert_eq!(f.page_title.as_deref(), Some("Profile: Jane Doe"));
    }

    #[test]
    fn page_title_heading_beats_earlier_h1() {
        let f = fields(
            r#"<body><h1>Issue Tracker</h1><h1 class="page-title"> Jane Doe </h1></body>"#,
        );
        assert_eq!(f.full_name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn heading_falls_back_to_first_h1() {
        let f = fields("<body><h1>Jane <span>Doe</span></h1><h1>Other</h1></body>");
        assert_eq!(f.full_name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn heading_finders_are_ordered() {
        let doc = Html::parse_document(
            r#"<!DOCTYPE html><h1>a</h1><h1 class="page-title">b</h1>"#,
        );
        assert_eq!((HEADING_FINDERS[1].find)(&doc).map(text_of).as_deref(), Some("a"));
        assert_eq!(first_match(&doc, HEADING_FINDERS).map(text_of).as_deref(), Some("b"));
    }

    #[test]
    fn user_logo_image_wins_over_alt() {
        let f = fields(
            r#"<body>
                <img alt="User Avatar" src="https://cdn/alt.png">
                <img class="userLogo" src="//cdn/logo.png">
            </body>"#,
        );
        assert_eq!(f.avatar_url.as_deref(), Some("https://cdn/logo.png"));
    }

    #[test]
    fn avatar_alt_fallback_is_case_sensitive() {
        let f = fields(
            r#"<body>
                <img alt="small avatar" src="/wrong.png">
                <img alt="jdoe Avatar" src="/secure/useravatar?avatarId=1">
            </body>"#,
        );
        assert_eq!(
            f.avatar_url.as_deref(),
            Some("https://issues.example.org/secure/useravatar?avatarId=1")
        );

        let f = fields(r#"<body><img alt="avatar" src="/a.png"></body>"#);
        assert_eq!(f.avatar_url, None);
    }

    #[test]
    fn user_logo_without_src_yields_nothing() {
        let f = fields(
            r#"<body><img class="userLogo"><img alt="Avatar" src="/a.png"></body>"#,
        );
        assert_eq!(f.avatar_url, None);
    }

    #[test]
    fn first_mailto_link_is_email() {
        let f = fields(
            r#"<body>
                <a href="https://example.org">site</a>
                <a href="mailto:jane@example.com">mail</a>
                <a href="mailto:other@example.com">mail</a>
            </body>"#,
        );
        assert_eq!(f.email.as_deref(), Some("jane@example.com"));
    }

    #[test]
    fn mailto_must_be_a_prefix() {
        let f = fields(r#"<body><a href="/x?next=mailto:a@b.c">x</a></body>"#);
        assert_eq!(f.email, None);
    }

    #[test]
    fn every_mailto_scheme_is_removed() {
        let f = fields(r#"<body><a href="mailto:a@b.c?cc=mailto:x@y.z">x</a></body>"#);
        assert_eq!(f.email.as_deref(), Some("a@b.c?cc=x@y.z"));
    }

    #[test]
    fn username_prefers_data_attribute() {
        let f = fields(
            r#"<body><span class="user-hover" data-username="jdoe">Jane Doe</span></body>"#,
        );
        assert_eq!(f.username.as_deref(), Some("jdoe"));
    }

    #[test]
    fn username_falls_back_to_text() {
        let f = fields(r#"<body><span class="user-hover"> jdoe </span></body>"#);
        assert_eq!(f.username.as_deref(), Some("jdoe"));

        let f = fields(r#"<body><span class="user-hover" data-username="">jd</span></body>"#);
        assert_eq!(f.username.as_deref(), Some("jd"));
    }
}
