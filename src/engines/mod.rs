//! Engine adapters: a single capability-set trait implemented by the simple
//! KV/prefix engine and the complex full-text/faceted engine. The dispatcher
//! is polymorphic only over [`SearchEngine`].

pub mod complex;
pub mod simple;

pub use complex::ComplexEngine;
pub use simple::SimpleEngine;

use crate::error::Result;
use crate::types::{SearchRequest, SearchResponse};
use async_trait::async_trait;

#[async_trait]
pub trait SearchEngine: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse>;

    /// Fan out with an inflated page size so a later intersection (the
    /// hybrid plan's simple-engine `filter_by_ids` leg) still has enough
    /// candidates left to fill a page. Engines with no overfetch concept of
    /// their own can ignore `overfetch_factor` and defer to `search`.
    async fn search_overfetched(&self, request: &SearchRequest, overfetch_factor: u32) -> Result<SearchResponse> {
        let _ = overfetch_factor;
        self.search(request).await
    }

    async fn suggest(&self, prefix: &str, entity: &[String], limit: u32, tenant_id: &str) -> Result<SearchResponse>;

    /// Restrict to a set of ids, preserving this engine's own result order.
    /// Used by the dispatcher's hybrid plan to intersect with the complex
    /// engine's result set.
    async fn filter_by_ids(&self, request: &SearchRequest, ids: &[String]) -> Result<SearchResponse>;

    async fn health(&self) -> bool;
}
