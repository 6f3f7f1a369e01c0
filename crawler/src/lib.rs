//! The grawler crawl engine: frontier scheduling, eligibility policy,
//! robots handling, fetching, parsing and persistence hand-off.

pub mod config;
pub mod fetch;
pub mod frontier;
pub mod parse;
pub mod pipeline;
pub mod robots;
pub mod seeds;
