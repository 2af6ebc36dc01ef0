//! Remedy Extract - stateless text extraction for security advisories.
//!
//! Turns fetched HTML into plain text, pulls identifiers and patch download
//! links out of it, and scores how useful an extracted record is.
//!
//! Nothing in this crate performs I/O or holds state; every function is safe
//! to call concurrently from any worker.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod clean;
pub mod entities;
pub mod error;
pub mod links;
pub mod quality;
pub mod record;

pub use clean::{clean_html, decode_entities};
pub use entities::{
    extract_commit_hashes, extract_cves, extract_ghsa_ids, extract_kbs, extract_versions,
    Identifiers,
};
pub use error::ExtractionFieldError;
pub use links::{extract_download_links, is_artifact_link, is_excluded_link, resolve_link};
pub use quality::{assess_quality, meaningful_chars, QualityReport};
pub use record::{sanitize_field, Classification, KeyField, PartialRecord, MAX_FIELD_CHARS};
