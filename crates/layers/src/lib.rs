pub mod diagram;
pub mod headless;
pub mod host;
pub mod layer;
pub mod markers;
pub mod overlay;
pub mod symbology;

pub use diagram::*;
pub use host::*;
pub use layer::*;
pub use markers::*;
pub use overlay::*;
