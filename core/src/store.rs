use crate::{HostRecord, Page};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Persistence boundary for pages, word rows and host records. Shared by
/// every worker as a trait object; implementations must be thread-safe.
pub trait Store: Send + Sync {
    /// Existence and last crawl time for a URL. The timestamp is the UNIX
    /// epoch when no row exists.
    fn check_page(&self, url: &str) -> Result<(bool, OffsetDateTime)>;

    /// Whether any stored page carries this content hash.
    fn check_hash(&self, hash: &str) -> Result<bool>;

    /// Insert a new page row and write its text to `document_path`.
    fn insert_page(&self, page: &Page) -> Result<()>;

    /// Replace the row for `page.url` and overwrite its text file. The
    /// previous content hash is retired so hash dedup tracks live rows only.
    fn update_page(&self, page: &Page) -> Result<()>;

    /// Remove every word row for a URL. Idempotent.
    fn delete_words(&self, url: &str) -> Result<()>;

    /// Land all word rows for a URL atomically, replacing any survivors.
    fn insert_words(&self, url: &str, frequencies: &HashMap<String, u32>) -> Result<()>;

    /// Robots text and fetch time for a host; `exists` is false for hosts
    /// never crawled.
    fn get_robots(&self, host: &str) -> Result<(String, OffsetDateTime, bool)>;

    /// Write-through refresh of a host's robots text and fetch time.
    fn update_robots(&self, host: &str, robots_text: &str, fetched_at: OffsetDateTime)
        -> Result<()>;

    /// Create the durable row for a newly discovered host.
    fn insert_host(&self, record: &HostRecord) -> Result<()>;
}

/// Host component of a document folder name; colons (ports) become `_`.
pub fn sanitize_host(host: &str) -> String {
    host.replace(':', "_")
}

/// Path component of a document file name: leading `/` stripped, remaining
/// separators flattened to `_`.
pub fn sanitize_path(path: &str) -> String {
    path.strip_prefix('/').unwrap_or(path).replace('/', "_")
}

/// `<documents_dir>/<sanitized_host>/<sanitized_path>.txt`
pub fn document_path(documents_dir: &Path, host: &str, path: &str) -> PathBuf {
    documents_dir
        .join(sanitize_host(host))
        .join(format!("{}.txt", sanitize_path(path)))
}

/// Embedded store: one sled database with a tree per table.
///
/// Trees: `pages` url -> Page, `hashes` hex hash -> url, `hosts`
/// host -> HostRecord, `words` "url\0word" -> u32 LE frequency.
pub struct SledStore {
    db: sled::Db,
    pages: sled::Tree,
    hashes: sled::Tree,
    hosts: sled::Tree,
    words: sled::Tree,
}

const WORD_KEY_SEP: u8 = 0;

fn word_key(url: &str, word: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(url.len() + word.len() + 1);
    key.extend_from_slice(url.as_bytes());
    key.push(WORD_KEY_SEP);
    key.extend_from_slice(word.as_bytes());
    key
}

fn word_prefix(url: &str) -> Vec<u8> {
    let mut prefix = url.as_bytes().to_vec();
    prefix.push(WORD_KEY_SEP);
    prefix
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(&path).context("opening sled database")?;
        tracing::debug!(path = %path.as_ref().display(), "sled store opened");
        Ok(Self {
            pages: db.open_tree("pages")?,
            hashes: db.open_tree("hashes")?,
            hosts: db.open_tree("hosts")?,
            words: db.open_tree("words")?,
            db,
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Full page row for a URL.
    pub fn get_page(&self, url: &str) -> Result<Option<Page>> {
        match self.pages.get(url.as_bytes())? {
            Some(raw) => Ok(Some(bincode::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// All word rows for a URL.
    pub fn words_for(&self, url: &str) -> Result<HashMap<String, u32>> {
        let prefix = word_prefix(url);
        let mut frequencies = HashMap::new();
        for entry in self.words.scan_prefix(&prefix) {
            let (key, value) = entry?;
            let word = String::from_utf8_lossy(&key[prefix.len()..]).into_owned();
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&value);
            frequencies.insert(word, u32::from_le_bytes(raw));
        }
        Ok(frequencies)
    }

    fn write_document(&self, page: &Page) -> Result<()> {
        let path = Path::new(&page.document_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &page.text)
            .with_context(|| format!("writing document {}", page.document_path))?;
        Ok(())
    }
}

impl Store for SledStore {
    fn check_page(&self, url: &str) -> Result<(bool, OffsetDateTime)> {
        match self.get_page(url)? {
            Some(page) => Ok((true, page.time_crawled)),
            None => Ok((false, OffsetDateTime::UNIX_EPOCH)),
        }
    }

    fn check_hash(&self, hash: &str) -> Result<bool> {
        Ok(self.hashes.contains_key(hash.as_bytes())?)
    }

    fn insert_page(&self, page: &Page) -> Result<()> {
        self.write_document(page)?;
        self.pages.insert(page.url.as_bytes(), bincode::serialize(page)?)?;
        self.hashes.insert(page.hash.as_bytes(), page.url.as_bytes())?;
        Ok(())
    }

    fn update_page(&self, page: &Page) -> Result<()> {
        if let Some(old) = self.get_page(&page.url)? {
            if old.hash != page.hash {
                self.hashes.remove(old.hash.as_bytes())?;
            }
        }
        self.write_document(page)?;
        self.pages.insert(page.url.as_bytes(), bincode::serialize(page)?)?;
        self.hashes.insert(page.hash.as_bytes(), page.url.as_bytes())?;
        Ok(())
    }

    fn delete_words(&self, url: &str) -> Result<()> {
        let mut batch = sled::Batch::default();
        for entry in self.words.scan_prefix(word_prefix(url)) {
            let (key, _) = entry?;
            batch.remove(key);
        }
        self.words.apply_batch(batch)?;
        Ok(())
    }

    fn insert_words(&self, url: &str, frequencies: &HashMap<String, u32>) -> Result<()> {
        let mut batch = sled::Batch::default();
        for entry in self.words.scan_prefix(word_prefix(url)) {
            let (key, _) = entry?;
            batch.remove(key);
        }
        for (word, frequency) in frequencies {
            batch.insert(word_key(url, word), frequency.to_le_bytes().to_vec());
        }
        self.words.apply_batch(batch)?;
        Ok(())
    }

    fn get_robots(&self, host: &str) -> Result<(String, OffsetDateTime, bool)> {
        match self.hosts.get(host.as_bytes())? {
            Some(raw) => {
                let record: HostRecord = bincode::deserialize(&raw)?;
                Ok((record.robots_text, record.timestamp, true))
            }
            None => Ok((String::new(), OffsetDateTime::UNIX_EPOCH, false)),
        }
    }

    fn update_robots(
        &self,
        host: &str,
        robots_text: &str,
        fetched_at: OffsetDateTime,
    ) -> Result<()> {
        let mut record = match self.hosts.get(host.as_bytes())? {
            Some(raw) => bincode::deserialize::<HostRecord>(&raw)?,
            None => HostRecord {
                host: host.to_string(),
                robots_text: String::new(),
                site_name: String::new(),
                icon_link: String::new(),
                timestamp: fetched_at,
            },
        };
        record.robots_text = robots_text.to_string();
        record.timestamp = fetched_at;
        self.hosts.insert(host.as_bytes(), bincode::serialize(&record)?)?;
        Ok(())
    }

    fn insert_host(&self, record: &HostRecord) -> Result<()> {
        self.hosts.insert(record.host.as_bytes(), bincode::serialize(record)?)?;
        Ok(())
    }
}
