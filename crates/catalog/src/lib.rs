pub mod event;
pub mod geojson;
pub mod normalize;
pub mod stats;

pub use event::*;
pub use geojson::*;
pub use normalize::*;
pub use stats::*;
