use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tracing::{info, warn};

pub const DEFAULT_SERVER: &str = "https://issues.jenkins.io";

/// Where the tracker lives and how to authenticate against it.
#[derive(Args, Clone)]
pub struct TrackerArgs {
    /// Tracker base URL
    #[arg(long, global = true, env = "JIRA_MIGRATION_JIRA_URL", default_value = DEFAULT_SERVER)]
    pub server: String,
    /// Session cookie, e.g. "JSESSIONID=abc; atlassian.xsrf.token=xyz"
    #[arg(long, global = true, env = "JIRA_COOKIE", default_value = "", hide_env_values = true)]
    pub cookie: String,
    /// Basic auth user (used when no cookie is given)
    #[arg(long, global = true, env = "JIRA_USERNAME", default_value = "")]
    pub username: String,
    /// Basic auth password
    #[arg(long, global = true, env = "JIRA_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,
}

impl TrackerArgs {
    pub fn auth(&self) -> Auth {
        let auth = Auth::resolve(&self.cookie, &self.username, &self.password);
        match &auth {
            Auth::Cookie(_) => info!("Using cookie authentication"),
            Auth::Basic { .. } => info!("Using basic authentication"),
            Auth::Anonymous => {
                warn!("No authentication configured. Some pages may be inaccessible.")
            }
        }
        auth
    }
}

/// Inputs and pacing for a full migration run.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// File with one user ID per line
    #[arg(long, env = "USER_IDS_FILE", default_value = "jira_user_ids.txt")]
    pub ids: PathBuf,
    /// Aggregate JSON output
    #[arg(short, long, env = "OUTPUT_FILE", default_value = "jira_users.json")]
    pub output: PathBuf,
    /// Directory avatars are saved into
    #[arg(long, env = "AVATARS_DIR", default_value = "avatars")]
    pub avatars_dir: PathBuf,
    /// Seconds to wait between requests
    #[arg(long, env = "DELAY_SECONDS", default_value = "0.5", value_parser = parse_delay)]
    pub delay: Duration,
    /// Only process the first N IDs
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

fn parse_delay(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw.trim().parse().map_err(|e| format!("{e}"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("delay must be a non-negative number of seconds, got {raw}"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("delay {raw} out of range: {e}"))
}

#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    Cookie(Vec<(String, String)>),
    Basic { username: String, password: String },
    Anonymous,
}

impl Auth {
    /// Cookie beats basic auth; basic auth needs both halves.
    pub fn resolve(cookie: &str, username: &str, password: &str) -> Self {
        if !cookie.trim().is_empty() {
            Auth::Cookie(parse_cookie_header(cookie))
        } else if !username.is_empty() && !password.is_empty() {
            Auth::Basic {
                username: username.to_string(),
                password: password.to_string(),
            }
        } else {
            Auth::Anonymous
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Cookie(pairs) => {
                let names: Vec<&str> = pairs.iter().map(|(n, _)| n.as_str()).collect();
                f.debug_tuple("Cookie").field(&names).finish()
            }
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Auth::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// Split `a=1; b=2` into pairs. Segments without `=` are dropped; values
/// may themselves contain `=`.
pub fn parse_cookie_header(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|part| {
            let (name, value) = part.split_once('=')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

// ── Tests ──
