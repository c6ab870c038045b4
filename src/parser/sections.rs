use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::dom::{class_label, first_match, sel, text_of, Finder};
use crate::record::{DetailKey, Section};

static DL: LazyLock<Selector> = LazyLock::new(|| sel("dl"));
static DT: LazyLock<Selector> = LazyLock::new(|| sel("dt"));
static DD: LazyLock<Selector> = LazyLock::new(|| sel("dd"));
static TABLE: LazyLock<Selector> = LazyLock::new(|| sel("table"));
static TR: LazyLock<Selector> = LazyLock::new(|| sel("tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| sel("td, th"));
static PANEL_BY_ID: LazyLock<Selector> = LazyLock::new(|| sel("div#user-profile-panel"));
static PANEL_BY_CLASS: LazyLock<Selector> = LazyLock::new(|| sel("div.profile-panel"));
static SUB_PANEL: LazyLock<Selector> = LazyLock::new(|| sel("div[class], section[class]"));

pub const PROFILE_DETAILS: &str = "profile_details";

pub const PANEL_FINDERS: &[Finder] = &[
    Finder { name: "div#user-profile-panel", find: panel_by_id },
    Finder { name: "div.profile-panel", find: panel_by_class },
];

fn panel_by_id(doc: &Html) -> Option<ElementRef<'_>> {
    doc.select(&PANEL_BY_ID).next()
}

fn panel_by_class(doc: &Html) -> Option<ElementRef<'_>> {
    doc.select(&PANEL_BY_CLASS).next()
}

/// Output of the three section passes.
///
/// `entries` keeps pass order (definition lists, tables, sub-panels) and
/// document order within each pass, so inserting them one by one into a map
/// gives last-writer-wins on key collisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    pub details: BTreeMap<DetailKey, String>,
    pub entries: Vec<(String, Section)>,
}

pub fn extract(doc: &Html) -> Sections {
    let mut details = BTreeMap::new();
    let mut entries = definition_blocks(doc, &mut details);
    entries.extend(tables(doc));
    entries.extend(sub_panels(doc));
    Sections { details, entries }
}

/// One `profile_details` entry per non-empty `<dl>`.
///
/// Terms and descriptions pair by position; when the counts differ the
/// surplus on the longer side is dropped. Recognized terms are also written
/// to `details`.
pub fn definition_blocks(
    doc: &Html,
    details: &mut BTreeMap<DetailKey, String>,
) -> Vec<(String, Section)> {
    let mut out = Vec::new();

    for dl in doc.select(&DL) {
        let mut fields = BTreeMap::new();
        for (dt, dd) in dl.select(&DT).zip(dl.select(&DD)) {
            let key = text_of(dt).trim_end_matches(':').to_string();
            let value = text_of(dd);
            if let Some(detail) = DetailKey::from_label(&key) {
                details.insert(detail, value.clone());
            }
            fields.insert(key, value);
        }
        if !fields.is_empty() {
            out.push((PROFILE_DETAILS.to_string(), Section::Fields(fields)));
        }
    }

    out
}

/// `table_<i>` per table with at least one non-empty row. `i` counts every
/// `<table>` on the page, so skipped tables leave gaps.
pub fn tables(doc: &Html) -> Vec<(String, Section)> {
    doc.select(&TABLE)
        .enumerate()
        .filter_map(|(i, table)| {
            let rows: Vec<Vec<String>> = table
                .select(&TR)
                .map(|tr| tr.select(&CELL).map(text_of).collect::<Vec<_>>())
                .filter(|row| !row.is_empty())
                .collect();
            (!rows.is_empty()).then(|| (format!("table_{i}"), Section::Table(rows)))
        })
        .collect()
}

/// Classed `div`/`section` descendants of the profile panel, keyed by their
/// class list. Nothing when neither panel container is present.
pub fn sub_panels(doc: &Html) -> Vec<(String, Section)> {
    let Some(panel) = first_match(doc, PANEL_FINDERS) else {
        return Vec::new();
    };

    panel
        .select(&SUB_PANEL)
        .filter(|el| el.id() != panel.id())
        .filter_map(|el| {
            let label = class_label(el)?;
            let text = text_of(el);
            (!text.is_empty()).then(|| (label, Section::Text(text)))
        })
        .collect()
}

// ── Tests ──
