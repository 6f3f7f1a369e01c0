use crate::config::Config;
use crate::fetch;
use crate::frontier::Frontier;
use crate::parse;
use crate::robots::{RobotsPolicy, RobotsVerdict};
use anyhow::Result;
use grawler_core::store::{self, Store};
use grawler_core::{text, tokenizer, urls, HostRecord, Page, Task};
use parking_lot::Mutex;
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;

/// Terminal state of one pipeline pass over a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Persisted,
    Dropped,
    Requeued,
}

/// State shared by every crawl worker: configuration, the HTTP client, the
/// store handle, the frontier, and the in-memory dedup/politeness caches.
pub struct Engine {
    config: Config,
    client: Client,
    store: Arc<dyn Store>,
    frontier: Arc<Frontier>,
    robots: RobotsPolicy,
    crawled_urls: Mutex<HashSet<String>>,
    host_last_crawled: Mutex<HashMap<String, Instant>>,
}

impl Engine {
    pub fn new(config: Config, store: Arc<dyn Store>, frontier: Arc<Frontier>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(config.timeout())
            .build()?;
        let robots = RobotsPolicy::new(config.ttl(), config.user_agent.clone());
        Ok(Self {
            client,
            store,
            frontier,
            robots,
            crawled_urls: Mutex::new(HashSet::new()),
            host_last_crawled: Mutex::new(HashMap::new()),
            config,
        })
    }

    /// Run one task through the pipeline:
    /// eligibility -> fetch -> parse -> hash dedup -> persist -> fan out.
    pub async fn crawl_task(&self, task: Task) -> Outcome {
        let parts = match urls::url_parts(&task.url) {
            Ok(parts) => parts,
            Err(err) => {
                tracing::error!(url = %task.url, %err, "unparseable url");
                return Outcome::Dropped;
            }
        };

        // scheme allow-list
        if parts.scheme != "http" && parts.scheme != "https" {
            return Outcome::Dropped;
        }

        // already completed in this process
        if self.crawled_urls.lock().contains(&task.url) {
            tracing::debug!(url = %task.url, "already crawled");
            return Outcome::Dropped;
        }

        // robots.txt is policy, never a crawl target
        if parts.path == "/robots.txt" {
            return Outcome::Dropped;
        }

        // persistent recency: a fresh stored row wins; an old one flips this
        // task onto the update path
        let page_exists = match self.store.check_page(&task.url) {
            Ok((true, crawled_at)) => {
                if OffsetDateTime::now_utc() - crawled_at < self.config.ttl() {
                    return Outcome::Dropped;
                }
                true
            }
            Ok((false, _)) => false,
            Err(err) => {
                tracing::error!(url = %task.url, %err, "page lookup failed, assuming absent");
                false
            }
        };

        // per-host politeness: too soon, back of the line
        let deferred = {
            let hosts = self.host_last_crawled.lock();
            hosts
                .get(&parts.host)
                .is_some_and(|last| last.elapsed() < self.config.host_delay())
        };
        if deferred {
            self.frontier.push(task).await;
            return Outcome::Requeued;
        }

        let verdict = if self.config.respect_robots {
            self.robots
                .check(&self.client, self.store.as_ref(), &parts.scheme, &parts.host, &task.url)
                .await
        } else {
            RobotsVerdict {
                allowed: true,
                robots_text: String::new(),
                host_known: self.host_known(&parts.host),
            }
        };
        if !verdict.allowed {
            tracing::warn!(url = %task.url, "disallowed by robots.txt");
            return Outcome::Dropped;
        }

        tracing::info!(url = %task.url, "crawling");
        let response = match fetch::fetch_page(&self.client, &task.url).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(url = %task.url, %err, "fetch failed");
                return Outcome::Dropped;
            }
        };
        if response.status_code >= 400 {
            tracing::error!(url = %task.url, status = response.status_code, "fetch rejected");
            return Outcome::Dropped;
        }
        if !fetch::content_type_allowed(&response.content_type) {
            return Outcome::Dropped;
        }

        let body = text::sanitize_utf8(&response.body);
        let parsed = match response.content_type.as_str() {
            "text/html" => parse::parse_html(&body),
            _ => parse::parse_plain(&body),
        };

        let page_text = text::normalize(&parsed.text);
        let hash = text::sha256_hex(&page_text);

        // cross-URL content dedup
        match self.store.check_hash(&hash) {
            Ok(true) => {
                tracing::debug!(url = %task.url, "content already stored under another url");
                return Outcome::Dropped;
            }
            Ok(false) => {}
            Err(err) => {
                tracing::error!(url = %task.url, %err, "hash lookup failed, assuming absent");
            }
        }

        let base = urls::base_url(&parts);
        let mut metadata = parsed.metadata;
        parse::finalize_metadata(&mut metadata, &page_text, &parts.host, &base);

        if !verdict.host_known {
            let record = HostRecord {
                host: parts.host.clone(),
                robots_text: verdict.robots_text.clone(),
                site_name: metadata.site_name.clone(),
                icon_link: metadata.icon_link.clone(),
                timestamp: OffsetDateTime::now_utc(),
            };
            if let Err(err) = self.store.insert_host(&record) {
                tracing::error!(host = %parts.host, %err, "host insert failed");
                return Outcome::Dropped;
            }
            let host_dir =
                Path::new(&self.config.documents_dir).join(store::sanitize_host(&parts.host));
            if let Err(err) = std::fs::create_dir_all(&host_dir) {
                tracing::error!(host = %parts.host, %err, "host folder create failed");
                return Outcome::Dropped;
            }
        }

        let document_path =
            store::document_path(Path::new(&self.config.documents_dir), &parts.host, &parts.path);
        let page = Page {
            url: task.url.clone(),
            parent_url: task.parent_url.clone(),
            host: parts.host.clone(),
            metadata,
            text: page_text,
            hash,
            time_crawled: OffsetDateTime::now_utc(),
            document_path: document_path.to_string_lossy().into_owned(),
        };

        let frequencies = tokenizer::word_frequencies(&page.text);
        let persisted = if page_exists {
            self.store
                .update_page(&page)
                .and_then(|()| self.store.delete_words(&page.url))
                .and_then(|()| self.store.insert_words(&page.url, &frequencies))
        } else {
            self.store
                .insert_page(&page)
                .and_then(|()| self.store.insert_words(&page.url, &frequencies))
        };
        if let Err(err) = persisted {
            tracing::error!(url = %page.url, %err, "persist failed");
            return Outcome::Dropped;
        }

        self.host_last_crawled.lock().insert(parts.host.clone(), Instant::now());
        self.crawled_urls.lock().insert(page.url.clone());

        self.push_children(&parsed.links, &task.url, &base);

        tracing::info!(url = %page.url, "done crawling");
        Outcome::Persisted
    }

    fn push_children(&self, links: &[String], parent_url: &str, base: &str) {
        for href in links {
            let Some(child) = urls::canonicalize_child(href, base) else {
                continue;
            };
            if !self.frontier.try_push(Task::child(child, parent_url)) {
                tracing::debug!(%href, "frontier full, dropping child link");
            }
        }
    }

    fn host_known(&self, host: &str) -> bool {
        self.store
            .get_robots(host)
            .map(|(_, _, exists)| exists)
            .unwrap_or(false)
    }
}

/// Worker loop: dequeue, run the pipeline, report completion. Exits when
/// the frontier drains. A politeness defer naps briefly so a lone deferred
/// host does not spin the loop.
pub async fn run_worker(engine: Arc<Engine>) {
    while let Some(task) = engine.frontier.pop().await {
        let outcome = engine.crawl_task(task).await;
        if outcome == Outcome::Requeued {
            tokio::time::sleep(std::time::Duration::from_millis(15)).await;
        }
        engine.frontier.complete();
    }
}
