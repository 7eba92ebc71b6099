//! Property-based tests for the envelope codec.
//!
//! Random shapes, dtypes, and contents must round-trip bit-exactly, strided
//! views must encode like their contiguous copies, and the local note must
//! never leak into the envelope.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use framewire::{codec, Frame, Tensor};
use proptest::prelude::*;

fn shape_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..5, 1..4)
}

fn tensor_strategy() -> impl Strategy<Value = Tensor> {
    shape_strategy().prop_flat_map(|shape| {
        let count: usize = shape.iter().product();
        prop_oneof![
            prop::collection::vec(any::<f32>(), count)
                .prop_map({
                    let shape = shape.clone();
                    move |values| Tensor::from_f32(values, &shape).unwrap()
                })
                .boxed(),
            prop::collection::vec(any::<f64>(), count)
                .prop_map({
                    let shape = shape.clone();
                    move |values| Tensor::from_f64(values, &shape).unwrap()
                })
                .boxed(),
            prop::collection::vec(any::<i32>(), count)
                .prop_map({
                    let shape = shape.clone();
                    move |values| Tensor::from_i32(values, &shape).unwrap()
                })
                .boxed(),
            prop::collection::vec(any::<i64>(), count)
                .prop_map({
                    let shape = shape.clone();
                    move |values| Tensor::from_i64(values, &shape).unwrap()
                })
                .boxed(),
            prop::collection::vec(any::<u8>(), count)
                .prop_map(move |values| Tensor::from_u8(values, &shape).unwrap())
                .boxed(),
        ]
    })
}

proptest! {
    #[test]
    fn round_trip_is_bit_exact(
        tensor in tensor_strategy(),
        id in "[a-zA-Z0-9_-]{1,16}",
        label in "[a-zA-Z0-9 ]{0,24}",
    ) {
        let frame = Frame::new(id.clone(), label.clone(), tensor.clone(), "local only");
        let bytes = codec::encode(&frame).unwrap();
        let decoded = codec::decode(&bytes).unwrap();

        prop_assert_eq!(decoded.id, id);
        prop_assert_eq!(decoded.label, label);
        prop_assert_eq!(decoded.tensor.dtype(), tensor.dtype());
        prop_assert_eq!(decoded.tensor.shape(), tensor.shape());
        prop_assert_eq!(
            decoded.tensor.to_row_major_bytes(),
            tensor.to_row_major_bytes()
        );
        prop_assert!(decoded.tensor.is_contiguous());
    }

    #[test]
    fn strided_view_encodes_like_its_copy(tensor in tensor_strategy()) {
        let view = tensor.transposed();
        let copy = Tensor::from_row_major_bytes(
            view.dtype(),
            view.shape(),
            &view.to_row_major_bytes(),
        )
        .unwrap();

        let from_view = codec::encode(&Frame::new("p", "strided", view, "")).unwrap();
        let from_copy = codec::encode(&Frame::new("p", "strided", copy, "")).unwrap();
        prop_assert_eq!(from_view, from_copy);
    }

    #[test]
    fn note_never_reaches_the_wire(marker in "[a-zA-Z]{12,32}") {
        let tensor = Tensor::from_f32(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let frame = Frame::new("p-note", "exclusion", tensor, marker.clone());

        let bytes = codec::encode(&frame).unwrap();
        let leaked = bytes
            .windows(marker.len())
            .any(|w| w == marker.as_bytes());
        prop_assert!(!leaked);
    }
}
