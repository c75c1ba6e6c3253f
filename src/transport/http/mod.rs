//! HTTP transport: warp routes on the orchestrator, reqwest on the agents

pub mod client;
pub mod server;

pub use client::HttpOrchestratorClient;
pub use server::{api_routes, routes, OrchestratorServer};
