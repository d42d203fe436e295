pub mod cli;
pub mod client;
pub mod config;
pub mod instances;
pub mod mcp;
pub mod query;
pub mod serde_utils;

#[cfg(test)]
mod test_support;
