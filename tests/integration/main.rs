//! Black-box integration tests, exercising only `fermenator`'s public API.

mod fixtures;
mod hot_reload;
mod scenarios;
