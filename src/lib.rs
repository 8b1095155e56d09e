// src/lib.rs

//! jobwatch: hh.ru vacancy watcher with Telegram notifications

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
