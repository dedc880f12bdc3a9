//! MCP tool modules.
//!
//! Tools are grouped by what they touch: archive-wide search, a single item's
//! metadata and file list, and file downloads.

pub mod download;
pub mod item;
pub mod search;
