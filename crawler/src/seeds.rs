use anyhow::Result;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
struct SeedList {
    seed_list: Vec<String>,
}

/// Load the JSON seed file: `{"seed_list": ["https://...", ...]}`.
pub fn load(path: &str) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)?;
    let seeds: SeedList = serde_json::from_str(&raw)?;
    Ok(seeds.seed_list)
}
