pub mod cooker;
pub mod reader;
pub mod types;
