// Report pipeline: generate (LLM → store → email) and render (store → HTML).
// The two halves share nothing but the stored record and its key format.

pub mod emails;
pub mod generator;
pub mod handlers;
pub mod render;
pub mod tokens;

/// Render endpoint path embedded in every report link.
pub const REPORT_PATH: &str = "/api/report";
