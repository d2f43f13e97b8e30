//! Lease manager core for a distributed key-value store.
//!
//! A [`Lessor`] issues time-bounded ownership tokens ("leases"), tracks the
//! set of stored items bound to each lease, expires leases once their
//! deadline passes while this replica is primary, and publishes expired
//! leases on a bounded outbound queue for an external revocation consumer.
//!
//! This crate does not decide which replica is primary — that is an
//! externally driven role, flipped via [`Lessor::promote`] /
//! [`Lessor::demote`] — nor does it talk to a network. It consumes two
//! injected capabilities: a persistent [`lessor_engine::Backend`] and an
//! application-supplied [`RangeDeleter`].

/// Wire encoding of persisted lease records
mod codec;
/// Background expiry scanner
mod expiry;
/// Error taxonomy
mod error;
/// Monotonic lease-ID allocator
mod id_gen;
/// Shared, lock-guarded lessor state
mod inner;
/// In-memory lease record
mod lease;
/// Injected range-delete capability
mod range_deleter;
/// Primary / non-primary role
mod role;

/// Public facade
mod facade;

pub use error::LessorError;
pub use facade::Lessor;
pub use id_gen::IdGenerator;
pub use lease::Lease;
pub use range_deleter::RangeDeleter;
pub use role::Role;

#[cfg(test)]
mod test;
