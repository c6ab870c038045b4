use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use tracing::{debug, info, warn};
use url::Url;

use crate::parser::ProfilePage;
use crate::record::UserRecord;
use crate::settings::Auth;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
const TIMEOUT: Duration = Duration::from_secs(30);
const LOGIN_MARKER: &str = "Log in to Jira";

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid cookie header: {0}")]
    Header(#[from] header::InvalidHeaderValue),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// `JIRAUSER…` ids are internal keys and go in `?id=`; anything else is a
/// login name and goes in `?name=`.
pub fn profile_url(base_url: &str, user_id: &str) -> Result<Url, url::ParseError> {
    let param = if user_id.starts_with("JIRAUSER") { "id" } else { "name" };
    let page = format!("{}/secure/ViewProfile.jspa", base_url.trim_end_matches('/'));
    Url::parse_with_params(&page, &[(param, user_id)])
}

/// The tracker answers anonymous requests for protected pages with its
/// login form rather than an error status.
pub fn is_login_wall(final_url: &str, body: &str) -> bool {
    final_url.to_lowercase().contains("login") || body.contains(LOGIN_MARKER)
}

pub fn avatar_extension(url: &str) -> &'static str {
    if url.contains(".jpg") || url.contains(".jpeg") {
        ".jpg"
    } else if url.contains(".gif") {
        ".gif"
    } else {
        ".png"
    }
}

/// One HTTP client shared by every request of a run.
pub struct Session {
    http: reqwest::Client,
    auth: Auth,
    base_url: String,
}

impl Session {
    pub fn new(base_url: &str, auth: Auth) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        if let Auth::Cookie(pairs) = &auth {
            let joined = pairs
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            let mut value = HeaderValue::from_str(&joined)?;
            value.set_sensitive(true);
            headers.insert(header::COOKIE, value);
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            auth,
            base_url: base_url.to_string(),
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.http.get(url);
        match &self.auth {
            Auth::Basic { username, password } => req.basic_auth(username, Some(password)),
            _ => req,
        }
    }

    /// Fetch one profile page. `Ok(None)` means the tracker wanted a login.
    pub async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfilePage>, FetchError> {
        let url = profile_url(&self.base_url, user_id)?.to_string();
        let response = self.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status, url });
        }

        let final_url = response.url().to_string();
        let html = response.text().await?;
        if is_login_wall(&final_url, &html) {
            return Ok(None);
        }

        Ok(Some(ProfilePage {
            user_id: user_id.to_string(),
            profile_url: url,
            html,
        }))
    }

    /// Save the avatar as `<dir>/<user_id><ext>` and return the file name.
    pub async fn download_avatar(
        &self,
        user_id: &str,
        avatar_url: &str,
        dir: &Path,
    ) -> Result<String, FetchError> {
        let filename = format!("{user_id}{}", avatar_extension(avatar_url));

        let response = self.get(avatar_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: avatar_url.to_string(),
            });
        }
        let bytes = response.bytes().await?;
        tokio::fs::write(dir.join(&filename), &bytes).await?;

        debug!("Saved {} ({} bytes)", filename, bytes.len());
        Ok(filename)
    }
}

/// Fetch stats returned after completion.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub total: usize,
    pub ok: usize,
    pub auth_walls: usize,
    pub errors: usize,
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta}) {msg}")?
            .progress_chars("=> "),
    );
    Ok(pb)
}

/// Fetch profiles one at a time, pausing `delay` between requests.
///
/// Login walls and failures are logged and skipped; nothing is retried.
/// Returned pages keep the order of `user_ids`.
pub async fn fetch_profiles(
    session: &Session,
    user_ids: &[String],
    delay: Duration,
) -> Result<(Vec<ProfilePage>, FetchStats)> {
    let pb = progress_bar(user_ids.len())?;
    let mut pages = Vec::with_capacity(user_ids.len());
    let mut stats = FetchStats {
        total: user_ids.len(),
        ..Default::default()
    };

    for (i, user_id) in user_ids.iter().enumerate() {
        pb.set_message(user_id.clone());
        match session.fetch_profile(user_id).await {
            Ok(Some(page)) => {
                stats.ok += 1;
                pages.push(page);
            }
            Ok(None) => {
                stats.auth_walls += 1;
                warn!("Authentication required for {}", user_id);
            }
            Err(e) => {
                stats.errors += 1;
                warn!("Error fetching {}: {}", user_id, e);
            }
        }
        pb.inc(1);

        if i + 1 < user_ids.len() {
            tokio::time::sleep(delay).await;
        }
    }

    pb.finish_and_clear();
    info!(
        "Fetched {} profiles ({} ok, {} auth required, {} errors)",
        stats.total, stats.ok, stats.auth_walls, stats.errors
    );
    Ok((pages, stats))
}

/// Download avatars for every record that has an `avatar_url` and record
/// the saved file name. Returns how many were saved.
pub async fn download_avatars(
    session: &Session,
    records: &mut [UserRecord],
    dir: &Path,
    delay: Duration,
) -> Result<usize> {
    let wanted = records.iter().filter(|r| r.avatar_url.is_some()).count();
    let pb = progress_bar(wanted)?;
    let mut saved = 0usize;
    let mut attempted = 0usize;

    for record in records.iter_mut() {
        let Some(avatar_url) = record.avatar_url.clone() else {
            continue;
        };
        if attempted > 0 {
            tokio::time::sleep(delay).await;
        }
        attempted += 1;

        pb.set_message(record.id.clone());
        match session.download_avatar(&record.id, &avatar_url, dir).await {
            Ok(filename) => {
                record.avatar_filename = Some(filename);
                saved += 1;
            }
            Err(e) => warn!("Failed to download avatar for {}: {}", record.id, e),
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Saved {} of {} avatars", saved, wanted);
    Ok(saved)
}

// ── Tests ──
