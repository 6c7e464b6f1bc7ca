pub mod cooker;
pub mod reader;
pub mod types;

#[cfg(test)]
mod tests;
