//! Hand-feed replay: NDJSON parsing and file playback.

use std::io::Write;

use archmage_client::vision::{parse_frame, spawn_replay};
use archmage_core::gesture::LANDMARKS_PER_HAND;

fn frame_line() -> String {
    let landmarks: Vec<String> = (0..LANDMARKS_PER_HAND)
        .map(|i| format!(r#"{{"x": {:.2}, "y": 0.5}}"#, i as f32 / 40.0))
        .collect();
    format!(r#"{{"landmarks": [{}]}}"#, landmarks.join(","))
}

#[test]
fn parse_frame_reads_one_ndjson_line() {
    let frame = parse_frame(&frame_line()).unwrap();
    assert_eq!(frame.landmarks.len(), LANDMARKS_PER_HAND);
    assert!((frame.landmarks[2].x - 0.05).abs() < 1e-6);
}

#[test]
fn parse_frame_rejects_garbage() {
    assert!(parse_frame("not json").is_err());
    assert!(parse_frame(r#"{"landmarks": "nope"}"#).is_err());
}

#[test]
fn replay_streams_good_lines_and_skips_bad_ones() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{}", frame_line()).unwrap();
    writeln!(file, "this line is broken").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "{}", frame_line()).unwrap();
    file.flush().unwrap();

    let mut rx = spawn_replay(file.path()).unwrap();
    let first = rx.blocking_recv().expect("first frame");
    assert_eq!(first.landmarks.len(), LANDMARKS_PER_HAND);
    let second = rx.blocking_recv().expect("second frame");
    assert_eq!(second.landmarks.len(), LANDMARKS_PER_HAND);
    // Broken and blank lines were skipped; the feed then closes
    assert!(rx.blocking_recv().is_none());
}

#[test]
fn replay_errors_on_a_missing_file() {
    assert!(spawn_replay(std::path::Path::new("/definitely/not/here.ndjson")).is_err());
}
