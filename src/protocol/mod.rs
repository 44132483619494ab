//! Wire-level vocabulary of the job tracker.
//!
//! Only the message model lives here; byte encoding belongs to the transport.

pub mod codes;
pub mod command;

pub use codes::*;
pub use command::*;
