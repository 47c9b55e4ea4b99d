#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use cirrus_cloud as cloud;

#[doc(inline)]
pub use cirrus_ops as ops;
