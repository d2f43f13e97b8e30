/// Whether this lessor instance is currently responsible for expiring and
/// renewing leases. Driven externally by `Promote` / `Demote`; a
/// reimplementation may observe a brief window where two replicas both
/// believe themselves primary during an RSM leadership handover. That is
/// tolerable — the stale primary's proposals are rejected upstream — and
/// this type must not grow extra safeguards assuming a single primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Responsible for expiring and renewing leases.
    Primary,
    /// Every lease is held at a far-future expiry; `Renew` is rejected.
    NonPrimary,
}
