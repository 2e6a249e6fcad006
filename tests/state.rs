// Writer lifecycle: defining → writing → closed, with every out-of-order
// operation rejected.

use nc4::{CreateOpts, DType, NcFile, NcError, Value};

fn scratch(name: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(name);
    (dir, path)
}

fn assert_state(err: NcError, what: &str) {
    assert!(matches!(err, NcError::State(_)), "{what}: got {err}");
}

/// Creating over an existing file fails unless overwrite is set.
#[test]
fn overwrite_flag() {
    let (_dir, path) = scratch("exists.nc");
    std::fs::write(&path, b"occupied").unwrap();
    let err = NcFile::create(&path, &CreateOpts::default()).unwrap_err();
    assert!(matches!(err, NcError::Invalid(_)), "got {err}");
    let opts = CreateOpts {
        overwrite: true,
        ..CreateOpts::default()
    };
    NcFile::create(&path, &opts).unwrap();
}

/// No define-phase API works after end_define.
#[test]
fn define_after_end_define_fails() {
    let (_dir, path) = scratch("frozen.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "x", 2).unwrap();
    f.end_define().unwrap();
    assert_state(f.add_dimension(root, "y", 2).unwrap_err(), "add_dimension");
    assert_state(
        f.add_variable(root, "v", DType::Int, &["x"]).unwrap_err(),
        "add_variable",
    );
    assert_state(f.add_group(root, "g").unwrap_err(), "add_group");
    assert_state(
        f.add_group_attr(root, "a", Value::from(1i32)).unwrap_err(),
        "add_attribute",
    );
}

/// end_define is not idempotent: the second call fails.
#[test]
fn double_end_define_fails() {
    let (_dir, path) = scratch("twice.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    f.end_define().unwrap();
    assert_state(f.end_define().unwrap_err(), "second end_define");
}

/// Data writes are rejected before end_define and after close.
#[test]
fn write_phase_boundaries() {
    let (_dir, path) = scratch("phases.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "x", 2).unwrap();
    let v = f.add_variable(root, "v", DType::Int, &["x"]).unwrap();
    let data = Value::from(vec![1i32, 2]);
    assert_state(
        f.write(v, Some(&[0]), &data).unwrap_err(),
        "write before end_define",
    );
    f.end_define().unwrap();
    f.write(v, Some(&[0]), &data).unwrap();
    f.close().unwrap();
    assert_state(
        f.write(v, Some(&[0]), &data).unwrap_err(),
        "write after close",
    );
}

/// close before end_define, and close twice, both fail.
#[test]
fn close_transitions() {
    let (_dir, path) = scratch("close.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    assert_state(f.close().unwrap_err(), "close while defining");
    f.end_define().unwrap();
    f.close().unwrap();
    assert_state(f.close().unwrap_err(), "double close");
}

/// close with unwritten chunks fails and names every missing chunk by path.
#[test]
fn close_lists_missing_chunks() {
    let (_dir, path) = scratch("missing.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "x", 4).unwrap();
    let g = f.add_group(root, "obs").unwrap();
    let v = f
        .add_variable(g, "wind", DType::Float, &["x"])
        .unwrap();
    f.end_define().unwrap();
    let err = f.close().unwrap_err();
    let text = err.to_string();
    assert!(
        text.contains("/obs/wind") && text.contains("[0]"),
        "missing chunk must be listed with its path: {text}"
    );
    // Still recoverable: write the chunk, then close succeeds.
    f.write(v, Some(&[0]), &Value::from(vec![0f32; 4])).unwrap();
    f.close().unwrap();
}

/// A chunk address is written exactly once.
#[test]
fn double_chunk_write_fails() {
    let (_dir, path) = scratch("dup.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "x", 2).unwrap();
    let v = f.add_variable(root, "v", DType::Short, &["x"]).unwrap();
    f.end_define().unwrap();
    let data = Value::from(vec![1i16, 2]);
    f.write(v, Some(&[0]), &data).unwrap();
    assert_state(f.write(v, Some(&[0]), &data).unwrap_err(), "double write");
}

/// Writing to a "no data" attribute carrier is an input error.
#[test]
fn attr_carrier_rejects_data() {
    let (_dir, path) = scratch("carrier.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    let v = f.add_attr_variable(root, "meta", DType::Int).unwrap();
    f.end_define().unwrap();
    let err = f.write(v, None, &Value::from(1i32)).unwrap_err();
    assert!(matches!(err, NcError::Invalid(_)), "got {err}");
}
