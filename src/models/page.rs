//! Page content as delivered by the scraper and the inputs to classification.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Structured hints gathered alongside the page text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMetadata {
    pub url: String,
    pub domain: String,
    pub meta_tags: BTreeMap<String, String>,
    pub search_query: String,
    pub has_video: bool,
    pub has_login_form: bool,
    pub has_social_elements: bool,
    pub is_search_page: bool,
    pub content_length: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PageContent {
    pub title: String,
    pub full_text: String,
    pub metadata: PageMetadata,
}

/// Everything a classifier needs to judge one page against one task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRequest {
    pub url: String,
    pub title: String,
    pub task: String,
    pub content: String,
    pub metadata: Option<PageMetadata>,
}

impl ClassificationRequest {
    /// Title-only variant used for the instant first verdict.
    pub fn title_only(&self) -> Self {
        Self {
            url: self.url.clone(),
            title: self.title.clone(),
            task: self.task.clone(),
            content: String::new(),
            metadata: None,
        }
    }
}
