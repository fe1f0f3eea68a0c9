pub mod document;
pub mod listing;
pub mod responses;

pub use document::*;
pub use listing::*;
pub use responses::*;
