// src/lib.rs

//! Menu Crawler Library
//!
//! Discovers restaurant menus on the web, extracts dish records from HTML
//! menu pages and downloads menu documents.

pub mod catalog;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod testing;
