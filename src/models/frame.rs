//! The frame record handed to the codec.

use crate::models::tensor::Tensor;

/// A named, labeled array payload captured immediately before publishing.
///
/// Plain data storage: all fields are required, none are validated here.
/// Validation happens at encode time, where a frame with an empty `id` is
/// rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Short opaque identifier, e.g. a run or capture id.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// The array payload.
    pub tensor: Tensor,
    /// Operator note kept local to this process. The wire schema has no
    /// corresponding field, so it can never reach the envelope.
    pub local_note: String,
}

impl Frame {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        tensor: Tensor,
        local_note: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            tensor,
            local_note: local_note.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_stores_all_fields() {
        let tensor = Tensor::from_f32(vec![1.0, 2.0], &[2]).unwrap();
        let frame = Frame::new("run-001", "test-frame", tensor, "kept local");

        assert_eq!(frame.id, "run-001");
        assert_eq!(frame.label, "test-frame");
        assert_eq!(frame.tensor.shape(), &[2]);
        assert_eq!(frame.local_note, "kept local");
    }
}
