//! Core data models: frames and the tensors they carry.

pub mod frame;
pub mod tensor;

pub use frame::Frame;
pub use tensor::{Dtype, Tensor, TensorError};
