// Tally Kernel
//
// Shared append log and the reader channels that tail it.

pub mod channel;
pub mod config;
pub mod log;
pub mod replay;
pub mod sink;
pub mod write;
