//! URL handling module for Sumi-Folio
//!
//! This module provides URL normalization, domain extraction, and the link
//! eligibility filter used before anything reaches the frontier.

mod domain;
mod filter;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, same_host};
pub use filter::{is_eligible, LinkFilter};
pub use normalize::{normalize_parsed, normalize_url};
