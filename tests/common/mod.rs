//! Common test utilities for news-pager integration tests

#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;

use news_pager::{Config, PaginationController};
use wiremock::MockServer;

/// Config pointing at a mock server, page size 6
pub fn config_for(server: &MockServer) -> Config {
    Config::new(server.uri())
}

/// Controller wired through the real fetch client and article service
pub fn controller_for(server: &MockServer) -> PaginationController {
    match PaginationController::from_config(&config_for(server)) {
        Ok(controller) => controller,
        Err(e) => panic!("failed to build controller: {e}"),
    }
}
