//! Integration tests for perp-feed

mod config_test;
mod feed_test;
mod rest_test;
