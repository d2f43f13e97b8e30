/// Errors surfaced by the public lessor operations.
///
/// `Corrupt` is never meant to be handled by a caller: every construction
/// path that can produce it converts it into a panic immediately, per the
/// fatal-on-corruption policy — a broken on-disk invariant should never be
/// silently papered over.
#[derive(Debug, thiserror::Error)]
pub enum LessorError {
    /// The referenced lease ID is not known to this lessor.
    #[error("lease {0} not found")]
    NotFound(i64),

    /// `Renew` was called against a non-primary lessor.
    #[error("lessor is not primary")]
    NotPrimary,

    /// A persisted lease record failed to decode, or the ID generator
    /// produced an ID already present in the table.
    #[error("lessor store is corrupt: {0}")]
    Corrupt(String),

    /// The backend capability failed.
    #[error(transparent)]
    Backend(#[from] lessor_engine::EngineError),
}
