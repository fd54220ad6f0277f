//! Secondary stores cleared on a best-effort basis after the primary erasure.

/// A store outside the persistent key/value store that may hold derived
/// sensitive data, such as an in-memory result cache.
pub trait Erasable: Send + Sync {
    fn name(&self) -> &str;

    fn erase_all(&self) -> anyhow::Result<()>;
}
