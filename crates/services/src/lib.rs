//! # services
//!
//! Core business logic of agora, written against the `domains` ports. The
//! two components here, the interaction ledger and the reputation engine,
//! carry all of the system's real invariants; everything around them is
//! adapter plumbing.

pub mod interactions;
pub mod reputation;

pub use interactions::{InteractionService, InteractionUpdate};
pub use reputation::{BatchOutcome, ReputationService};
