pub mod record;
pub mod entry;
pub mod transport;
pub mod shipper;
pub mod layer;
pub mod context;

#[cfg(feature = "http")]
pub mod loki;

pub mod init;
pub mod noop;
pub mod env;
