// SPDX-License-Identifier: MIT

pub mod file;
pub mod scrape;
pub mod search;

pub use file::WriteFileTool;
pub use scrape::WebScrapeTool;
pub use search::{BraveSearchTool, SearchResult, WebSearchResult};
