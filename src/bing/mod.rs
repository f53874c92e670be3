mod client;

pub use client::{BingClient, ConnectionTestResult};
