//! Live adapters that talk to the network.

pub mod transport;
