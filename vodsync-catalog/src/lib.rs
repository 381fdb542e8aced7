//! VOD catalog data model types, identity derivation, and playlist parsing.
//!
//! This crate defines the persistent data model for the catalog without
//! any database dependencies. Consumers can use these types directly for
//! display, or pass them to `vodsync-db` for persistence.

pub mod name_parser;
pub mod playlist;
pub mod types;

pub use name_parser::{derive_year, provider_unique_id, series_slug};
pub use playlist::{PlaylistEntry, parse_playlist};
pub use types::*;
