//! End-to-end tests for the batch pipeline and the watch-mode accumulator.

use sensor_windower::{
    build_windows, ingest, pipeline, CollectingSink, IngestCounters, NormalizePolicy,
    NormalizedRecord, Normalizer, OutputFormat, OutputTarget, SharedCounters, SharedSink,
    WindowSpec, WriteMode,
};
use std::io::Write;
use std::sync::Arc;

fn write_input(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("records.json");
    std::fs::write(&path, body).expect("write input");
    path
}

fn harness() -> (Normalizer, SharedSink, SharedCounters, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let events: SharedSink = sink.clone();
    let counters: SharedCounters = Arc::new(IngestCounters::new());
    let normalizer = Normalizer::new(
        None,
        NormalizePolicy::Lenient,
        events.clone(),
        counters.clone(),
    );
    (normalizer, events, counters, sink)
}

const CAN_CAPTURE: &str = r#"[
    {"name":"BRAKE","timestamp":1000.0,"id":166,"data":"{\"BRAKE_AMOUNT\": 39, \"BRAKE_PEDAL\": 18}","raw":"0x2700125000000037"},
    {"name":"BRAKE","timestamp":1001.0,"id":166,"data":"{\"BRAKE_AMOUNT\": 41, \"BRAKE_PEDAL\": 19}","raw":"0x2700135000000038"},
    {"name":"Unknown","timestamp":1001.2,"id":303,"data":"ff7fff7fff7fffb1","raw":"0xff7fff7fff7fffb1"},
    {"name":"SPEED","timestamp":1001.5,"id":180,"data":"{\"ENCODER\": 1, \"SPEED\": 15.48, \"CHECKSUM\": 207}","raw":"0x0000000001060ccf"},
    {"name":"BRAKE","timestamp":"invalid","id":166,"data":"{\"BRAKE_AMOUNT\": 40}","raw":"0x2800135000000039"}
]"#;

#[test]
fn batch_run_produces_csv_and_json_artifacts() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = write_input(&dir, CAN_CAPTURE);
    let (normalizer, events, counters, _) = harness();
    let spec = WindowSpec::new(2.0, None).expect("valid spec");

    let raws = ingest::read_records(&input).expect("input parses");
    let windows = pipeline::process_records(&raws, &normalizer, &spec, &events, &counters);
    assert_eq!(windows.len(), 1);

    let csv_path = dir.path().join("windows.csv");
    let json_path = dir.path().join("windows.json");
    let targets = vec![
        OutputTarget::new(csv_path.clone(), OutputFormat::Csv),
        OutputTarget::new(json_path.clone(), OutputFormat::Json),
    ];
    pipeline::write_outputs(&windows, &targets, WriteMode::SingleShot, &events, &counters)
        .expect("artifacts written");

    let csv_text = std::fs::read_to_string(&csv_path).expect("csv exists");
    assert!(csv_text.starts_with('\u{feff}'));
    let mut lines = csv_text.trim_start_matches('\u{feff}').lines();
    assert_eq!(
        lines.next(),
        Some(
            "window_index;window_start;window_end;\
             min_BRAKE_AMOUNT;max_BRAKE_AMOUNT;mean_BRAKE_AMOUNT;std_BRAKE_AMOUNT;\
             min_BRAKE_PEDAL;max_BRAKE_PEDAL;mean_BRAKE_PEDAL;std_BRAKE_PEDAL;\
             min_CHECKSUM;max_CHECKSUM;mean_CHECKSUM;std_CHECKSUM;\
             min_ENCODER;max_ENCODER;mean_ENCODER;std_ENCODER;\
             min_SPEED;max_SPEED;mean_SPEED;std_SPEED"
        )
    );
    assert_eq!(lines.count(), 1);

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).expect("json exists"))
            .expect("valid json");
    let object = &parsed[0];
    assert_eq!(object["window_index"], 0);
    assert_eq!(object["window_start"], 1000.0);
    assert_eq!(object["window_end"], 1002.0);
    assert_eq!(object["min_BRAKE_AMOUNT"], 39.0);
    assert_eq!(object["max_BRAKE_AMOUNT"], 41.0);
    assert_eq!(object["mean_BRAKE_AMOUNT"], 40.0);
    // Single SPEED sample: the std columns are null.
    assert_eq!(object["std_SPEED"], serde_json::Value::Null);

    let snapshot = counters.snapshot();
    assert_eq!(snapshot.records_seen, 5);
    assert_eq!(snapshot.records_skipped, 2);
    assert_eq!(snapshot.windows_built, 1);
    assert_eq!(snapshot.flushes, 2);
}

#[test]
fn empty_input_yields_no_artifact_and_no_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = write_input(&dir, "[]");
    let (normalizer, events, counters, _) = harness();
    let spec = WindowSpec::new(2.0, None).expect("valid spec");

    let raws = ingest::read_records(&input).expect("input parses");
    let windows = pipeline::process_records(&raws, &normalizer, &spec, &events, &counters);
    assert!(windows.is_empty());

    let target = OutputTarget::new(dir.path().join("windows.csv"), OutputFormat::Csv);
    pipeline::write_outputs(&windows, &[target.clone()], WriteMode::SingleShot, &events, &counters)
        .expect("empty result is not an error");
    assert!(!target.path.exists());
}

#[test]
fn buffered_and_single_shot_artifacts_are_identical() {
    let records: Vec<NormalizedRecord> = (0..25)
        .map(|i| {
            NormalizedRecord::new(
                1000.0 + i as f64,
                [("value".to_string(), (i * 3) as f64)],
            )
        })
        .collect();
    let spec = WindowSpec::new(4.0, Some(2.0)).expect("valid spec");
    let windows = build_windows(records, &spec);
    assert!(windows.len() > 2);

    for format in [OutputFormat::Csv, OutputFormat::Json] {
        let mut reference = Vec::new();
        match format {
            OutputFormat::Csv => {
                sensor_windower::write_csv(&windows, &mut reference, WriteMode::SingleShot)
            }
            OutputFormat::Json => {
                sensor_windower::write_json(&windows, &mut reference, WriteMode::SingleShot)
            }
        }
        .expect("single-shot write");

        for chunk_size in [1, 2, 7, windows.len(), 1000] {
            let mut buffered = Vec::new();
            let mode = WriteMode::Buffered { chunk_size };
            match format {
                OutputFormat::Csv => {
                    sensor_windower::write_csv(&windows, &mut buffered, mode)
                }
                OutputFormat::Json => {
                    sensor_windower::write_json(&windows, &mut buffered, mode)
                }
            }
            .expect("buffered write");
            assert_eq!(buffered, reference, "{format:?} with chunk size {chunk_size}");
        }
    }
}

#[test]
fn record_export_lists_timestamp_first() {
    let (normalizer, _, _, _) = harness();
    let raws: Vec<sensor_windower::RawRecord> = serde_json::from_str(CAN_CAPTURE).expect("parse");
    let records: Vec<NormalizedRecord> =
        raws.iter().filter_map(|raw| normalizer.normalize(raw)).collect();
    assert_eq!(records.len(), 3);

    let mut out = Vec::new();
    sensor_windower::write_csv(&records, &mut out, WriteMode::SingleShot).expect("write records");
    let text = String::from_utf8(out).expect("utf-8");
    let header = text
        .trim_start_matches('\u{feff}')
        .lines()
        .next()
        .expect("header row");
    assert!(header.starts_with("timestamp;"));
    assert!(header.contains("BRAKE_AMOUNT"));
    assert!(header.contains("SPEED"));
}

#[test]
fn source_filter_narrows_the_batch() {
    let sink = Arc::new(CollectingSink::new());
    let events: SharedSink = sink.clone();
    let counters: SharedCounters = Arc::new(IngestCounters::new());
    let normalizer = Normalizer::new(
        Some(vec!["brake".to_string()]),
        NormalizePolicy::Lenient,
        events,
        counters,
    );

    let raws: Vec<sensor_windower::RawRecord> = serde_json::from_str(CAN_CAPTURE).expect("parse");
    let records: Vec<NormalizedRecord> =
        raws.iter().filter_map(|raw| normalizer.normalize(raw)).collect();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|record| record.fields.contains_key("BRAKE_AMOUNT")));
}

#[test]
fn watch_chunk_parsing_survives_partial_lines() {
    let sink = Arc::new(CollectingSink::new());
    let events: SharedSink = sink.clone();

    let mut chunk = Vec::new();
    writeln!(chunk, r#"{{"name":"A","timestamp":1000.0,"data":"{{\"X\": 1}}"}}"#).expect("build");
    writeln!(chunk, r#"{{"name":"A","timestamp":1001.0,"da"#).expect("build");
    let records = ingest::parse_chunk(&chunk, &events);

    assert_eq!(records.len(), 1);
    assert_eq!(sink.events().len(), 1);
}
