// Application layer: the session that owns a ledger for the lifetime of one
// interactive budgeting screen and coordinates imports into it.

pub mod error;
pub mod session;

pub use error::*;
pub use session::*;
