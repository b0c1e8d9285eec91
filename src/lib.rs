pub mod app;
pub mod catalog;
pub mod config;
pub mod debounce;
pub mod details;
pub mod fetch;
pub mod gateway;
pub mod models;
pub mod player;
pub mod store;
pub mod tmdb;
pub mod views;
