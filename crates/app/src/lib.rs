pub mod analytics;
pub mod config;
pub mod connectivity;
mod context;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

pub use context::AppContext;
