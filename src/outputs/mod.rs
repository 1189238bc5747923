//! Output generation for rendered feeds.
//!
//! # Submodules
//!
//! - [`rss`]: Serializes a feed source and its extracted items to RSS 2.0
//!
//! # Output Structure
//!
//! ```text
//! <rss version="2.0">
//! └── channel: title, link, description, language, pubDate, lastBuildDate, generator
//!     ├── item: title, link, description, pubDate
//!     └── item: ...
//! ```

pub mod rss;
