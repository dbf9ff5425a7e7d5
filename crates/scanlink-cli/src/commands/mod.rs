//! Command implementations for scanlink-cli

pub mod connect;
pub mod list;
pub mod scan;

pub use connect::connect;
pub use list::list;
pub use scan::scan;
