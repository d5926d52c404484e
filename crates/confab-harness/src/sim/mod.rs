//! Deterministic in-process simulation of the collaboration service.

mod client;
mod world;

pub use client::SimClient;
pub use world::SimWorld;
