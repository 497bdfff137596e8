// src/lib.rs
//! Stock portfolio tracker: a REST service storing holdings and a client that
//! values them against a price feed.
pub mod api;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod models;
pub mod prices;
pub mod service;
pub mod view;
