use gpx_canonical_wasm::parser::parse_gpx;
use gpx_canonical_wasm::to_xml_string;
use std::path::Path;

fn load_fixture(path: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{path}")).unwrap()
}

fn normalize(gpx: &str) -> String {
    let data = parse_gpx(gpx).unwrap();
    to_xml_string(&data).unwrap()
}

/// Compare actual GPX output against the expected snapshot file.
/// When `UPDATE_SNAPSHOTS=1` is set, write/overwrite the expected file instead.
fn assert_snapshot(actual: &str, expected_path: &str) {
    let path = format!("tests/fixtures/expected/{expected_path}");

    if matches!(std::env::var("UPDATE_SNAPSHOTS").as_deref(), Ok("1")) {
        let dir = Path::new(&path).parent().unwrap();
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(&path, format!("{actual}\n")).unwrap();
        eprintln!("Updated snapshot: {path}");
        return;
    }

    let expected = std::fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("Expected file not found: {path}. Run with UPDATE_SNAPSHOTS=1 to generate."));

    assert_eq!(
        actual.trim_end(),
        expected.trim_end(),
        "Snapshot mismatch for {path}.\nRun with UPDATE_SNAPSHOTS=1 to update."
    );
}

#[test]
fn snapshot_complete_gpx11() {
    let actual = normalize(&load_fixture("gpx11/complete.gpx"));
    assert_snapshot(&actual, "complete.gpx");
}

#[test]
fn snapshot_legacy_gpx10() {
    let actual = normalize(&load_fixture("gpx10/legacy.gpx"));
    assert_snapshot(&actual, "legacy.gpx");
}

#[test]
fn snapshot_output_is_a_fixed_point() {
    for fixture in ["gpx11/complete.gpx", "gpx10/legacy.gpx"] {
        let once = normalize(&load_fixture(fixture));
        let twice = normalize(&once);
        assert_eq!(once, twice, "normalizing {fixture} twice changed the output");
    }
}
