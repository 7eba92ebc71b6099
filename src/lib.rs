#![forbid(unsafe_code)]

//! framewire: typed array frames with a versioned protobuf envelope and
//! MQTT publishing.
//!
//! The crate covers three concerns, consumed in sequence:
//! - Frame and tensor models with explicit row-major materialization
//! - A pure envelope codec over a stable, versioned protobuf schema
//! - A caller-owned MQTT publisher with mapped delivery guarantees,
//!   acknowledgment waiting, and latency measurement
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use framewire::{BrokerPublisher, DeliveryGuarantee, Frame, Tensor};
//! use framewire::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tensor = Tensor::from_f32(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3])?;
//!     let frame = Frame::new("run-001", "test-frame", tensor, "not published");
//!
//!     let mut publisher = BrokerPublisher::connect(&Config::default()).await?;
//!     let receipt = publisher
//!         .publish_frame("demo/packet", &frame, DeliveryGuarantee::AtLeastOnce)
//!         .await?;
//!     println!("acknowledged in {:?}", receipt.latency);
//!
//!     publisher.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod models;
pub mod proto;
pub mod publish;
pub mod telemetry;

// Re-export the types most callers need
pub use codec::{CodecError, DecodedFrame};
pub use models::{Dtype, Frame, Tensor, TensorError};
pub use publish::{BrokerPublisher, DeliveryGuarantee, DeliveryReceipt, PublishError};
