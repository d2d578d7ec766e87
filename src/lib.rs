pub mod ai;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod recipes;
pub mod state;
pub mod storage;

#[cfg(test)]
mod test_support;
