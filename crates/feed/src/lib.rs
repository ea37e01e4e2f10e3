pub mod arbiter;
pub mod registry;
pub mod source;

pub use arbiter::*;
pub use registry::*;
pub use source::*;
