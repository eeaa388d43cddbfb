//! Domain types shared by the scanner and the exchange loops.
//!
//! Everything here is plain data with no I/O dependencies.

pub mod node;
pub mod packet;
