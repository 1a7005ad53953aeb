//! Manifest extraction
//!
//! This module contains:
//! - The [`ManifestExtractor`] trait the batch runner drives
//! - An HTTP implementation that fetches a page and scans its markup
//! - The markup scanner used to spot m3u8 references

mod http;
mod scan;
mod traits;

pub use http::{build_http_client, HttpManifestExtractor};
pub use scan::{find_manifest_url, find_manifest_urls};
pub use traits::ManifestExtractor;
