//! Asset reference handling for Sumi-Harvest
//!
//! This module names the two string kinds the harvester deals with and derives
//! one from the other:
//! - `AssetReference`: a media URL candidate as read from the page
//! - `ContentIdentity`: the canonical id shared by all encoding variants of one asset

mod identity;

pub use identity::{resolve_identity, KNOWN_EXTENSIONS};

/// A discovered media URL candidate
pub type AssetReference = String;

/// Canonical identifier collapsing encoding variants of one asset
pub type ContentIdentity = String;
