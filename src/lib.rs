// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Agora Social Dynamics Suite ("The Agora")

pub mod audit;
pub mod cancel;
pub mod cat_tree;
pub mod classify;
pub mod config;
pub mod follow;
pub mod mem_pool;
pub mod network;
pub mod rates;
pub mod rng;
pub mod simulation;
pub mod summary;
pub mod tweets;
pub mod types;

pub use config::{ConfigError, SimConfig};
pub use simulation::AgoraSimulation;
pub use summary::SummaryRouter;
pub use types::*;
