//! Property tests for the frame decoder
//!
//! However a byte stream is cut into network chunks, the decoder must
//! produce the same frames as decoding it in one piece.

use super::*;
use proptest::prelude::*;

/// A line as it might appear in a provider stream
fn arb_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ,.!?\u{e9}\u{4e2d}\u{1f600}]{1,40}".prop_map(|t| {
            format!("data: {}", serde_json::json!({"choices": [{"delta": {"content": t}}]}))
        }),
        Just("data: [DONE]".to_string()),
        Just(": keep-alive".to_string()),
        Just(String::new()),
        "[a-z]{1,10}".prop_map(|t| format!("data:{t}")),
    ]
}

fn arb_stream() -> impl Strategy<Value = (Vec<u8>, bool)> {
    (prop::collection::vec(arb_line(), 0..20), any::<bool>()).prop_map(|(lines, crlf)| {
        let sep = if crlf { "\r\n" } else { "\n" };
        let mut body = String::new();
        for line in lines {
            body.push_str(&line);
            body.push_str(sep);
        }
        (body.into_bytes(), crlf)
    })
}

/// Cut `bytes` at the given (unsorted, possibly duplicate) offsets
fn split_at_points(bytes: &[u8], mut points: Vec<usize>) -> Vec<&[u8]> {
    points.iter_mut().for_each(|p| *p %= bytes.len() + 1);
    points.sort_unstable();
    points.dedup();

    let mut chunks = Vec::new();
    let mut start = 0;
    for p in points {
        chunks.push(&bytes[start..p]);
        start = p;
    }
    chunks.push(&bytes[start..]);
    chunks
}

proptest! {
    #[test]
    fn prop_chunking_does_not_change_frames(
        (body, _crlf) in arb_stream(),
        points in prop::collection::vec(any::<usize>(), 0..12),
    ) {
        let (expected, rest) = decode_frames(&body);
        prop_assert!(rest.is_empty());

        let mut decoder = FrameDecoder::new();
        let mut actual = Vec::new();
        for chunk in split_at_points(&body, points) {
            actual.extend(decoder.push(chunk));
        }
        prop_assert_eq!(decoder.pending(), 0);
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_leftover_is_suffix_without_newline(body in prop::collection::vec(any::<u8>(), 0..200)) {
        let (_, rest) = decode_frames(&body);
        prop_assert!(body.ends_with(rest));
        prop_assert!(!rest.contains(&b'\n'));
    }

    #[test]
    fn prop_content_survives_decoding(text in "[^\r\n]{1,60}") {
        let frame = content_frame(&text);
        let (frames, _) = decode_frames(frame.as_bytes());
        prop_assert_eq!(frames.len(), 1);
        let Frame::Data(payload) = &frames[0] else {
            return Err(TestCaseError::fail("expected data frame"));
        };
        let value: Value = serde_json::from_str(payload).unwrap();
        prop_assert_eq!(delta_content(&value), Some(text.as_str()));
    }
}
