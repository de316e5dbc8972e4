//! Page-content collaborator.
//!
//! The tracker asks for the content of a page right after navigating to it.
//! Implementations either return the content directly or leave it to the host
//! to push it later through `report_content`.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::PageContent;

#[async_trait]
pub trait PageScraper: Send + Sync {
    /// `Ok(None)` means the content will be delivered out of band. An error
    /// makes the tracker classify the page with empty content.
    async fn scrape(&self, url: &str, title: &str) -> Result<Option<PageContent>>;
}

/// Scraper for hosts (browser extensions) that inject their own content
/// script and report the result as a command.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostReportedContent;

#[async_trait]
impl PageScraper for HostReportedContent {
    async fn scrape(&self, _url: &str, _title: &str) -> Result<Option<PageContent>> {
        Ok(None)
    }
}
