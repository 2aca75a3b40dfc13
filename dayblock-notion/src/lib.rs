//! dayblock-notion: the Notion database behind the task store port

pub mod blocking;
pub mod bulk;
pub mod client;
pub mod error;
pub mod filter;
pub mod page;
pub mod properties;

pub use blocking::{block_on, BlockingStore};
pub use bulk::{patch_all, DEFAULT_CONCURRENCY};
pub use client::{NotionClient, NOTION_VERSION};
pub use error::NotionError;
pub use filter::{encode_filter, encode_query};
pub use page::{decode_page, encode_draft, encode_patch, parse_due};
pub use properties::PropertyNames;
