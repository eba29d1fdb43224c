//! In-memory record store and caller scope.
//!
//! The store is read-only for the lifetime of a query. It is loaded once from
//! a JSON inventory document and indexed so the point look-ups issued by value
//! transforms and computed fields stay O(1).

mod inventory;
mod scope;

pub use inventory::{Inventory, Record, RecordId, IDENTITY_FIELD};
pub use scope::{Scope, ScopeOptions};
