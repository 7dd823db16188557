pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod export;
pub mod migrate;
pub mod model;
pub mod models;
pub mod pages;
pub mod qr;
pub mod routes;
pub mod store;
