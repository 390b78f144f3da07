pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod object_id;
pub mod projects;
pub mod state;

#[cfg(test)]
mod test_support;
