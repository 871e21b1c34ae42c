pub mod api;
pub mod commands;
pub mod db;
pub mod models;
pub mod slug;
