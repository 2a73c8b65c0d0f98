//! OSDI APIs authenticate every request with an API key header
//! (`OSDI-API-Token` for Action Network).

mod types;

pub use types::{AuthConfig, DEFAULT_API_KEY_HEADER};

#[cfg(test)]
mod tests;
