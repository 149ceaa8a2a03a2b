pub mod cycle;
pub mod event_bus;

pub use cycle::*;
pub use event_bus::*;
