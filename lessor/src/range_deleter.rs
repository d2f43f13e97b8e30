use crate::error::LessorError;

/// External capability to delete application keys bound to a revoked or
/// expired lease. Injected at construction time; the lessor core never
/// interprets the key namespace itself.
///
/// Implementations must not re-enter the owning `Lessor` — `delete_range`
/// is called while the lessor's single mutex is held.
pub trait RangeDeleter: Send + Sync + 'static + std::fmt::Debug {
    /// Delete the range `[key, end)`. When `end` is empty, deletes the
    /// single key at `key`.
    ///
    /// Returns the number of keys deleted and an opaque revision assigned
    /// to the deletion; the lessor itself discards both.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion cannot be carried out.
    fn delete_range(&self, key: &[u8], end: &[u8]) -> Result<(u64, i64), LessorError>;
}

impl<T> RangeDeleter for std::sync::Arc<T>
where
    T: RangeDeleter,
{
    fn delete_range(&self, key: &[u8], end: &[u8]) -> Result<(u64, i64), LessorError> {
        T::delete_range(self, key, end)
    }
}
