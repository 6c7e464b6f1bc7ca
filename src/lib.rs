pub mod compress;
pub mod deps;
pub mod package;
pub mod progress;
pub mod project;
pub mod store;
