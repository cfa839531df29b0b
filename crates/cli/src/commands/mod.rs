pub mod catalog;
pub mod host;
pub mod resolve;
pub mod util;

pub use catalog::*;
pub use host::*;
pub use resolve::*;
pub use util::*;
