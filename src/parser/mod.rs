pub mod avatar;
pub mod dom;
pub mod fields;
pub mod sections;

use scraper::Html;

use crate::record::UserRecord;

/// Raw profile page plus the identity it was fetched for.
#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub user_id: String,
    pub profile_url: String,
    pub html: String,
}

/// Parse a profile page into a record. Never fails: anything missing on the
/// page is simply absent from the record.
pub fn parse_profile(page: &ProfilePage, base_url: &str) -> UserRecord {
    let doc = Html::parse_document(&page.html);
    assemble(&page.user_id, &page.profile_url, &doc, base_url)
}

/// Two-phase pipeline: fields + sections over the same tree, then merge.
pub fn assemble(user_id: &str, profile_url: &str, doc: &Html, base_url: &str) -> UserRecord {
    let found = fields::extract(doc, base_url);
    let found_sections = sections::extract(doc);

    let mut record = UserRecord::new(user_id, profile_url);
    record.page_title = found.page_title;
    record.full_name = found.full_name;
    record.avatar_url = found.avatar_url;
    record.email = found.email;
    record.username = found.username;
    record.details = found_sections.details;
    for (name, section) in found_sections.entries {
        record.sections.insert(name, section);
    }
    record
}

// ── Tests ──
