//! Service layer for the menu crawler.
//!
//! This module contains the business logic for:
//! - Menu link discovery (`MenuLinkFinder`)
//! - Dish extraction (`DishExtractor` and its heuristics)
//! - Source downloads (`ContentFetcher`)

pub mod dishes;
mod discovery;
mod fetcher;

pub use discovery::MenuLinkFinder;
pub use dishes::{DishExtractor, HeuristicStrategy};
pub use fetcher::{ContentFetcher, RetryPolicy, checksum};
