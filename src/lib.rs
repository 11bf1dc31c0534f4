pub mod config;
pub mod db;
pub mod handlers;
pub mod services;
pub mod utils;
pub mod views;
