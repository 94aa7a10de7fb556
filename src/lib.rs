//! JSON proxy over the NextBus XML prediction feed for the TTC.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod server;
pub mod sweep;

pub use client::{FeedFetcher, FeedQuery, NextBusClient};
pub use error::FeedError;
pub use server::{AppState, EtaServer};
