//! Voronoi overlay viewer: render cycle orchestration over a map host.

pub mod config;
pub mod controller;
pub mod cycle;

pub use config::{ConfigError, ViewerConfig};
pub use controller::{HostEvent, ViewportController};
pub use cycle::{
    FetchOutcome, Notice, PendingFetch, RenderContext, RenderCycle, perform_render_cycle,
    search_location,
};
