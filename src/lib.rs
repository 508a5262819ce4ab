pub mod collection;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod i18n;
pub mod media;
pub mod models;
pub mod security;
pub mod settings;
pub mod web;
