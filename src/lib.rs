pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod notice;
pub mod state;
pub mod storage;

pub use app::{App, AppParts};
pub use error::AppError;
