//! Request and response bodies

pub mod auth;
pub mod accounts;
pub mod billing;
pub mod platform;

use serde::Deserialize;

/// `?limit=&offset=` for paged listings
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PageParams {
    pub const DEFAULT_LIMIT: u32 = 50;
    pub const MAX_LIMIT: u32 = 200;

    /// Limit and offset with the limit clamped to `1..=MAX_LIMIT`
    pub fn resolve(&self) -> (u32, u32) {
        let limit = self
            .limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        (limit, self.offset.unwrap_or(0))
    }
}
