//! Context cache binding
//!
//! - [`CachedContentBinder`] wraps a model so every call carries a `cachedContent` reference
//! - [`ToolCacheGuard`] refuses tool attachment on cached models (configurable)
//! - [`resolve_grounding`] settles grounding vs. cache by precedence

mod binder;
mod guard;

pub use binder::{CacheBoundModel, CachedContentBinder};
pub use guard::{
    CacheConflictPolicy, ConflictResolution, GuardState, ToolCacheConflict, ToolCacheGuard,
    resolve_grounding,
};
