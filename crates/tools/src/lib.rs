//! Platform content resolvers.
//!
//! Given an allowlisted search-results URL, find the single result the user
//! most likely wants: Bilibili through its search API (with creator-aware
//! scoring), Reddit through its JSON search, and YouTube, TikTok, Douyin and
//! Xiaohongshu by scraping the results page.

mod bilibili;
mod fetch;
pub mod html;
mod lenient;
pub mod pages;
mod reddit;
pub mod resolver;
pub mod scoring;

pub use resolver::{ContentResolver, FirstResultResolver, PlatformEndpoints, RESOLVER_TIMEOUT, is_search_url_eligible};
