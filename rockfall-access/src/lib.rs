//! Access control for the rockfall console.
//!
//! [`evaluator`] holds the pure role and site predicates, [`guard`] the table
//! of views and actions built on them, and [`session`] the lifecycle that
//! keeps the current principal up to date.
pub mod error;
pub mod evaluator;
pub mod guard;
pub mod principal;
pub mod role;
pub mod session;

pub use error::SessionError;
pub use evaluator::{can_access_mine, has_role, AccessEvaluator};
pub use guard::{AccessDenied, Action, NavItem, View};
pub use principal::Principal;
pub use role::{Role, Vocabulary};
