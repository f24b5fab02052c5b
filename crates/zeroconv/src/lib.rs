#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use zeroconv_tensor as tensor;

#[doc(inline)]
pub use zeroconv_ops as ops;
