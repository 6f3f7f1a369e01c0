use grawler_core::store::Store;
use reqwest::{header, Client};
use robotstxt::DefaultMatcher;
use time::OffsetDateTime;

/// Outcome of the robots stage, carrying what the host-initialization
/// stage needs later in the pipeline.
#[derive(Debug)]
pub struct RobotsVerdict {
    pub allowed: bool,
    /// Robots body the decision was made against.
    pub robots_text: String,
    /// Whether the host already had a durable record before this task.
    pub host_known: bool,
}

/// Evaluate a robots body for one agent and URL. The matcher prefers the
/// agent's own group and falls back to `*`; an empty body allows everything.
pub fn agent_allowed(robots_text: &str, user_agent: &str, url: &str) -> bool {
    DefaultMatcher::default().one_agent_allowed_by_robots(robots_text, user_agent, url)
}

/// Per-host robots.txt policy backed by the store's host records, which
/// double as the persistent cache. Stale or missing entries are re-fetched
/// and written through.
pub struct RobotsPolicy {
    ttl: time::Duration,
    user_agent: String,
}

impl RobotsPolicy {
    pub fn new(ttl: time::Duration, user_agent: String) -> Self {
        Self { ttl, user_agent }
    }

    /// Decide whether `url` may be crawled.
    ///
    /// Store lookup failures are logged and treated as an unknown host. A
    /// refresh after a *definitive* robots response (any status) is written
    /// through; a transport failure is not, so the next task retries rather
    /// than locking an empty body in for a whole TTL.
    pub async fn check(
        &self,
        client: &Client,
        store: &dyn Store,
        scheme: &str,
        host: &str,
        url: &str,
    ) -> RobotsVerdict {
        let (mut robots_text, fetched_at, host_known) = match store.get_robots(host) {
            Ok(row) => row,
            Err(err) => {
                tracing::error!(%host, %err, "robots lookup failed, treating host as unknown");
                (String::new(), OffsetDateTime::UNIX_EPOCH, false)
            }
        };

        let now = OffsetDateTime::now_utc();
        if !host_known || now - fetched_at > self.ttl {
            let (fetched, definitive) = fetch_robots(client, scheme, host, &self.user_agent).await;
            robots_text = fetched;
            // Brand-new hosts are persisted at host initialization instead.
            if host_known && definitive {
                if let Err(err) = store.update_robots(host, &robots_text, now) {
                    tracing::error!(%host, %err, "persisting refreshed robots.txt failed");
                }
            }
        }

        let allowed = agent_allowed(&robots_text, &self.user_agent, url);
        RobotsVerdict { allowed, robots_text, host_known }
    }
}

/// GET `scheme://host/robots.txt`. Any failure yields an empty body, which
/// by robots convention allows everything. The second value is false only
/// for transport errors, where no server ever answered.
async fn fetch_robots(client: &Client, scheme: &str, host: &str, user_agent: &str) -> (String, bool) {
    let robots_url = format!("{scheme}://{host}/robots.txt");
    match client
        .get(&robots_url)
        .header(header::USER_AGENT, user_agent)
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => {
            (response.text().await.unwrap_or_default(), true)
        }
        Ok(response) => {
            tracing::warn!(%robots_url, status = %response.status(), "robots fetch rejected, allowing by default");
            (String::new(), true)
        }
        Err(err) => {
            tracing::warn!(%robots_url, %err, "robots fetch failed, allowing by default");
            (String::new(), false)
        }
    }
}
