//! Model-to-SQL mapping with revision based optimistic locking.
//!
//! Derive [`Model`] on a struct embedding a [`ModelTracking`], get a
//! [`Collection`] from a [`Database`] and chain filters before a terminal
//! operation:
//! ```ignore
//! #[derive(Model, Default, Clone)]
//! struct User {
//!     #[db(",pk")]
//!     id: i64,
//!     name: String,
//!     tracking: ModelTracking,
//! }
//!
//! let mut user = User::default();
//! db.collection::<User>()?.filter("name", "barv").first(&mut user).await?;
//! ```
pub use keel_core::*;
pub use keel_macros::*;
