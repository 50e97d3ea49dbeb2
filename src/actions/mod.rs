//! User-facing operations built on the explorer.
//!
//! Each function here answers one request of the front end:
//!
//! - [`browse`]: list a directory with disk usage and breadcrumbs
//! - [`dir_sizes`] / [`file_sizes`]: sizes on both sides of a path
//! - [`transfer`]: mirror a file or directory onto the other side
//! - [`check_integrity`] / [`update_hash`]: inspect or refresh a side-car

pub mod browse;
pub mod integrity;
pub mod sizes;
pub mod transfer;

pub use browse::{browse, Listing, ListingEntry};
pub use integrity::{check_integrity, update_hash};
pub use sizes::{dir_sizes, file_sizes, PairSizes};
pub use transfer::{transfer, transfer_file, TransferConfig, TransferError, TransferOutcome, TransferSummary};
