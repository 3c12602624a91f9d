pub mod auth;
pub mod config;
pub mod controller;
pub mod logging;
pub mod model;
pub mod view;
