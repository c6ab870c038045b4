use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Build a selector from a static pattern.
pub fn sel(pattern: &str) -> Selector {
    Selector::parse(pattern).unwrap_or_else(|e| panic!("bad selector {pattern:?}: {e}"))
}

/// All descendant text of an element, concatenated and trimmed.
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Space-joined class list in markup order, or `None` when there is none.
pub fn class_label(el: ElementRef<'_>) -> Option<String> {
    let classes: Vec<&str> = el
        .value()
        .attr("class")
        .map(|c| c.split_whitespace().collect())
        .unwrap_or_default();
    if classes.is_empty() {
        None
    } else {
        Some(classes.join(" "))
    }
}

/// One way of locating a candidate element. Fallback chains are slices of
/// these, tried in order until one hits.
pub struct Finder {
    pub name: &'static str,
    pub find: for<'a> fn(&'a Html) -> Option<ElementRef<'a>>,
}

/// Run finders in order and return the first element found.
pub fn first_match<'a>(doc: &'a Html, finders: &[Finder]) -> Option<ElementRef<'a>> {
    finders.iter().find_map(|f| {
        let hit = (f.find)(doc);
        if hit.is_some() {
            debug!(finder = f.name, "candidate found");
        }
        hit
    })
}
