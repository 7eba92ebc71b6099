//! Envelope codec: pure, stateless transformations between [`Frame`] and
//! the protobuf wire envelope.
//!
//! Both directions are single-shot and synchronous. Errors always surface
//! to the caller; the codec never emits a partial envelope and never
//! coerces an unknown element type.

use prost::Message;
use thiserror::Error;

use crate::models::frame::Frame;
use crate::models::tensor::{Dtype, Tensor, TensorError};
use crate::proto::{Packet, WIRE_VERSION};

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors from envelope encoding and decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Encode-time rejection of a frame with an empty id.
    #[error("frame id must not be empty")]
    EmptyIdentifier,

    /// The envelope names an element type with no wire representation.
    #[error("unsupported dtype tag {tag:?}")]
    UnsupportedDtype { tag: String },

    /// Structural inconsistency in an otherwise parseable envelope.
    #[error("malformed envelope: {reason}")]
    MalformedEnvelope { reason: String },

    /// The buffer is not a parseable protobuf envelope at all.
    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),
}

impl CodecError {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            reason: reason.into(),
        }
    }
}

/// The decoded contents of an envelope.
///
/// Carries exactly what crossed the wire: no local-note field exists in the
/// schema, so none can come back.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    /// Envelope format version; 0 for pre-versioned producers.
    pub version: u32,
    pub id: String,
    pub label: String,
    /// Contiguous row-major reconstruction of the array payload.
    pub tensor: Tensor,
}

/// Encode a frame into envelope bytes.
///
/// The tensor is materialized as a contiguous row-major buffer whatever its
/// current stride layout, so a strided view encodes byte-identically to its
/// contiguous copy. The input frame is not mutated.
pub fn encode(frame: &Frame) -> CodecResult<Vec<u8>> {
    if frame.id.is_empty() {
        return Err(CodecError::EmptyIdentifier);
    }
    Ok(Packet::from(frame).encode_to_vec())
}

/// Decode envelope bytes back into a [`DecodedFrame`].
///
/// Fails with [`CodecError::MalformedEnvelope`] when the array payload is
/// missing, a dimension does not fit the address space, the version is
/// newer than this crate understands, or the data length disagrees with
/// `product(shape) * size_of(dtype)`.
pub fn decode(buf: &[u8]) -> CodecResult<DecodedFrame> {
    let packet = Packet::decode(buf)?;

    if packet.version > WIRE_VERSION {
        return Err(CodecError::malformed(format!(
            "envelope version {} is newer than supported version {WIRE_VERSION}",
            packet.version
        )));
    }

    let array = packet
        .array
        .ok_or_else(|| CodecError::malformed("missing array payload"))?;

    let dtype = Dtype::from_tag(&array.dtype).ok_or_else(|| CodecError::UnsupportedDtype {
        tag: array.dtype.clone(),
    })?;

    let shape = array
        .shape
        .iter()
        .map(|&d| usize::try_from(d))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| CodecError::malformed("shape dimension exceeds the address space"))?;

    let tensor =
        Tensor::from_row_major_bytes(dtype, &shape, &array.data).map_err(|err| match err {
            TensorError::LengthMismatch { expected, actual } => CodecError::malformed(format!(
                "array data is {actual} bytes, expected {expected} for dtype {dtype} and shape {shape:?}"
            )),
            TensorError::ShapeMismatch { .. } | TensorError::ShapeOverflow { .. } => {
                CodecError::malformed(err.to_string())
            }
        })?;

    Ok(DecodedFrame {
        version: packet.version,
        id: packet.id,
        label: packet.label,
        tensor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::ArrayPayload;

    fn demo_frame() -> Frame {
        let tensor =
            Tensor::from_f32(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).expect("valid tensor");
        Frame::new("run-001", "test-frame", tensor, "kept local")
    }

    #[test]
    fn round_trip_preserves_wire_fields() {
        let frame = demo_frame();
        let bytes = encode(&frame).expect("encode");
        let decoded = decode(&bytes).expect("decode");

        assert_eq!(decoded.version, WIRE_VERSION);
        assert_eq!(decoded.id, "run-001");
        assert_eq!(decoded.label, "test-frame");
        assert_eq!(decoded.tensor, frame.tensor);
        assert!(decoded.tensor.is_contiguous());
    }

    #[test]
    fn empty_id_is_rejected_before_encoding() {
        let mut frame = demo_frame();
        frame.id.clear();
        assert!(matches!(encode(&frame), Err(CodecError::EmptyIdentifier)));
    }

    #[test]
    fn data_length_mismatch_is_malformed() {
        let packet = Packet {
            id: "run-001".to_owned(),
            label: "test-frame".to_owned(),
            array: Some(ArrayPayload {
                dtype: "float32".to_owned(),
                shape: vec![2, 3],
                data: vec![0u8; 10],
            }),
            version: WIRE_VERSION,
        };
        let result = decode(&packet.encode_to_vec());
        assert!(matches!(result, Err(CodecError::MalformedEnvelope { .. })));
    }

    #[test]
    fn missing_array_is_malformed() {
        let packet = Packet {
            id: "run-001".to_owned(),
            label: "test-frame".to_owned(),
            array: None,
            version: WIRE_VERSION,
        };
        let result = decode(&packet.encode_to_vec());
        assert!(matches!(result, Err(CodecError::MalformedEnvelope { .. })));
    }

    #[test]
    fn unknown_dtype_tag_is_rejected() {
        let packet = Packet {
            id: "run-001".to_owned(),
            label: "test-frame".to_owned(),
            array: Some(ArrayPayload {
                dtype: "complex128".to_owned(),
                shape: vec![1],
                data: vec![0u8; 16],
            }),
            version: WIRE_VERSION,
        };
        match decode(&packet.encode_to_vec()) {
            Err(CodecError::UnsupportedDtype { tag }) => assert_eq!(tag, "complex128"),
            other => panic!("expected UnsupportedDtype, got {other:?}"),
        }
    }

    #[test]
    fn newer_version_is_rejected() {
        let mut packet = Packet::from(&demo_frame());
        packet.version = WIRE_VERSION + 1;
        let result = decode(&packet.encode_to_vec());
        assert!(matches!(result, Err(CodecError::MalformedEnvelope { .. })));
    }

    #[test]
    fn pre_versioned_envelope_still_decodes() {
        let mut packet = Packet::from(&demo_frame());
        packet.version = 0;
        let decoded = decode(&packet.encode_to_vec()).expect("decode");
        assert_eq!(decoded.version, 0);
        assert_eq!(decoded.id, "run-001");
    }

    #[test]
    fn garbage_bytes_fail_protobuf_decode() {
        let result = decode(&[0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }
}
