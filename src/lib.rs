pub mod app;
pub mod domain;
pub mod game;
pub mod models;
pub mod shared;
pub mod web_socket;
