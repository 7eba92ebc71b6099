//! Wire message definitions for the frame envelope.
//!
//! These mirror `proto/packet.proto`, which is the schema of record for
//! cross-language subscribers. The structs are hand-maintained prost
//! messages so the build needs no protoc; field numbers 1-3 are frozen and
//! new fields append only.

use crate::models::frame::Frame;

/// Envelope format version written by this crate.
///
/// Version 0 means the field was absent, i.e. an envelope from a producer
/// that predates the version tag. Decoders accept 0 and [`WIRE_VERSION`].
pub const WIRE_VERSION: u32 = 1;

/// A multi-dimensional numeric array in row-major element order.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ArrayPayload {
    /// Element type tag, e.g. `"float32"`.
    #[prost(string, tag = "1")]
    pub dtype: String,
    /// Dimension sizes, outermost first.
    #[prost(uint64, repeated, tag = "2")]
    pub shape: Vec<u64>,
    /// Raw little-endian element bytes, `product(shape) * size_of(dtype)`
    /// long.
    #[prost(bytes = "vec", tag = "3")]
    pub data: Vec<u8>,
}

/// A published frame: identifier, label, and array payload.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Packet {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub label: String,
    #[prost(message, optional, tag = "3")]
    pub array: Option<ArrayPayload>,
    /// Envelope format version; 0 for pre-versioned producers.
    #[prost(uint32, tag = "4")]
    pub version: u32,
}

impl From<&Frame> for Packet {
    /// Map a native frame onto the wire packet.
    ///
    /// The tensor is materialized as a contiguous row-major buffer here, so
    /// strided views serialize identically to their contiguous copies. The
    /// frame's `local_note` has no wire field and is dropped by
    /// construction.
    fn from(frame: &Frame) -> Self {
        Self {
            id: frame.id.clone(),
            label: frame.label.clone(),
            array: Some(ArrayPayload {
                dtype: frame.tensor.dtype().tag().to_owned(),
                shape: frame.tensor.shape().iter().map(|&d| d as u64).collect(),
                data: frame.tensor.to_row_major_bytes(),
            }),
            version: WIRE_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tensor::Tensor;

    #[test]
    fn packet_from_frame_maps_all_wire_fields() {
        let tensor = Tensor::from_f32(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        let frame = Frame::new("run-001", "test-frame", tensor, "never on the wire");

        let packet = Packet::from(&frame);
        assert_eq!(packet.id, "run-001");
        assert_eq!(packet.label, "test-frame");
        assert_eq!(packet.version, WIRE_VERSION);

        let array = packet.array.expect("array payload present");
        assert_eq!(array.dtype, "float32");
        assert_eq!(array.shape, vec![2, 3]);
        assert_eq!(array.data.len(), 24);
    }

    #[test]
    fn strided_view_serializes_like_its_copy() {
        let tensor = Tensor::from_f32(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        let view = tensor.transposed();
        let copy = Tensor::from_row_major_bytes(view.dtype(), view.shape(), &view.to_row_major_bytes())
            .unwrap();

        let from_view = Packet::from(&Frame::new("a", "b", view, ""));
        let from_copy = Packet::from(&Frame::new("a", "b", copy, ""));
        assert_eq!(from_view, from_copy);
    }
}
