//! Product fan-out to downstream destinations.
//!
//! The transport behind a destination is opaque; this crate only decides
//! how many sends run at once and how failures are classified. One bad
//! destination never blocks or fails the others: the overall outcome is an
//! error only when every destination failed.

mod fanout;
mod sender;

pub use fanout::{DistributionError, Distributor, SendReport};
pub use sender::{ProductSender, SendError};
