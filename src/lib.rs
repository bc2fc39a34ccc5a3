pub mod assistant;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod operations;
pub mod realtime;
pub mod scheduler;
pub mod storage;
pub mod templates_structs;
