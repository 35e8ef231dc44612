//! Domain model for the forum and problem-set subsystems.
//!
//! # Responsibility
//! - Define write models (`New*`) with their validation rules.
//! - Define read models (`*Record`) returned by repositories.
//! - Define the soft-delete lifecycle state machine.
//!
//! # Invariants
//! - Every entity is identified by a stable integer row id.
//! - Per-viewer fields (`like_status`, `pass_status`, ...) are `None` for
//!   anonymous viewers.

pub mod lifecycle;
pub mod post;
pub mod problem;
pub mod user;
pub mod validation;
