//! Search coach backend: filtered web search against the Bing Web Search API and
//! quiz leaderboards, served over MCP.

pub mod bing;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod search;
pub mod server;
pub mod tools;
