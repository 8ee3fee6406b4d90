mod common;

use std::fs;

use common::{synthetic_photo, word_token, MockOcr};
use slipscan::pipeline::{DebugLevel, Pipeline};
use slipscan::session::{DebugArtifactWriter, ResultSession};

#[test]
fn full_run_persists_ordered_stage_artifacts_and_results() {
    let root = tempfile::tempdir().unwrap();
    let session = ResultSession::allocate(root.path(), "result").unwrap();
    let mut writer = DebugArtifactWriter::new(&session);

    let frame = synthetic_photo(400, 300, (80, 60, 320, 240));
    let mock = MockOcr::with_tokens(vec![word_token(2, 88.0, "TOTAL")]);

    let report = Pipeline::default().run(&frame, &mock, &mut writer).unwrap();
    assert!(report.success());

    session.write_text_result(&report.extraction.text).unwrap();
    session
        .write_markup_result(&report.extraction.markup)
        .unwrap();

    // Every stage of a full-debug run, in lexical (= pipeline) order.
    let mut names: Vec<String> = fs::read_dir(session.debug_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "01_original.png",
            "02_grayscale.png",
            "03_contrast.png",
            "04_blurred.png",
            "05_binary.png",
            "06_edges.png",
            "07_dilated.png",
            "08_closed.png",
            "09_inverted.png",
            "10_contours.png",
            "11_rectified.png",
            "12_rectified_edges.png",
            "13_ocr_input.png",
            "14_text_blocks.png",
            "15_text_lines.png",
            "16_words.png",
            "17_annotated.png",
        ]
    );
    assert_eq!(writer.artifacts().len(), names.len());

    assert!(session.dir().join("ocr_result.txt").is_file());
    assert!(session.dir().join("ocr_result.html").is_file());
}

#[test]
fn basic_debug_level_keeps_only_key_stages() {
    let root = tempfile::tempdir().unwrap();
    let session = ResultSession::allocate(root.path(), "result").unwrap();
    let mut writer = DebugArtifactWriter::new(&session);

    let frame = synthetic_photo(400, 300, (80, 60, 320, 240));
    let mock = MockOcr::with_tokens(Vec::new());

    let pipeline = Pipeline {
        debug_level: DebugLevel::Basic,
        ..Pipeline::default()
    };
    pipeline.run(&frame, &mock, &mut writer).unwrap();

    let mut names: Vec<String> = fs::read_dir(session.debug_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["01_original.png", "11_rectified.png"]);
}

#[test]
fn failed_boundary_detection_leaves_preprocessing_artifacts() {
    let root = tempfile::tempdir().unwrap();
    let session = ResultSession::allocate(root.path(), "result").unwrap();
    let mut writer = DebugArtifactWriter::new(&session);

    let frame = common::textured_frame(320, 240);
    let mock = MockOcr::with_tokens(Vec::new());

    let report = Pipeline::default().run(&frame, &mock, &mut writer).unwrap();
    assert!(!report.success());

    // The preprocessing chain up to the contour stage is on disk for
    // diagnosis; nothing after it was attempted.
    let names: Vec<String> = fs::read_dir(session.debug_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.contains(&"09_inverted.png".to_string()));
    assert!(!names.iter().any(|n| n.contains("rectified")));
}

#[test]
fn sessions_are_never_reused_across_runs() {
    let root = tempfile::tempdir().unwrap();
    let first = ResultSession::allocate(root.path(), "result").unwrap();
    let second = ResultSession::allocate(root.path(), "result").unwrap();
    assert_eq!(first.dir(), root.path().join("result1"));
    assert_eq!(second.dir(), root.path().join("result2"));
}
