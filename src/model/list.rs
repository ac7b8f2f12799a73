//! Pagination options and list responses

use super::artifact::Artifact;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Field a listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderBy {
    CreateTime,
    LastUpdateTime,
    Id,
}

impl FromStr for OrderBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATE_TIME" => Ok(Self::CreateTime),
            "LAST_UPDATE_TIME" => Ok(Self::LastUpdateTime),
            "ID" => Ok(Self::Id),
            other => Err(format!(
                "unknown order field '{}', expected CREATE_TIME, LAST_UPDATE_TIME or ID",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            other => Err(format!("unknown sort order '{}', expected ASC or DESC", other)),
        }
    }
}

/// Caller-facing pagination options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    /// Continuation token from a previous page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_order(mut self, order_by: OrderBy, sort_order: SortOrder) -> Self {
        self.order_by = Some(order_by);
        self.sort_order = Some(sort_order);
        self
    }

    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.next_page_token = Some(token.into());
        self
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    /// Empty when there are no further pages
    pub next_page_token: String,
    /// Page size the caller asked for, 0 when unspecified
    pub page_size: i32,
    /// Number of items actually returned
    pub size: i32,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>, next_page_token: Option<String>, page_size: Option<i32>) -> Self {
        let size = items.len() as i32;
        Self {
            items,
            next_page_token: next_page_token.unwrap_or_default(),
            page_size: page_size.unwrap_or_default(),
            size,
        }
    }

    pub fn has_next_page(&self) -> bool {
        !self.next_page_token.is_empty()
    }
}

pub type ArtifactList = ListResponse<Artifact>;
