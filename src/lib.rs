pub mod api;
pub mod app;
pub mod board;
pub mod config;
pub mod detail;
pub mod drag;
pub mod error;
pub mod filter;
pub mod logging;
pub mod model;
pub mod report;
pub mod request;
pub mod ui;
pub mod view;
