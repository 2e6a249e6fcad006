// Name validation and namespace rules at the public API surface.

use nc4::{CreateOpts, DType, NcFile, Value};

fn scratch(name: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(name);
    (dir, path)
}

/// Accepted name shapes: leading underscore or letter, then letters,
/// digits, dash, underscore, colon, space.
#[test]
fn legal_names_accepted() {
    let (_dir, path) = scratch("legal.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    for name in ["x", "_hidden", "air temp", "t:avg", "a-b_c9"] {
        f.add_dimension(root, name, 1).unwrap();
    }
}

/// Rejected name shapes fail with an input-validity error before any
/// object is created.
#[test]
fn illegal_names_rejected() {
    let (_dir, path) = scratch("illegal.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    for name in ["", "9lives", "-x", " pad", "tab\there", "a/b", "ünicode"] {
        let err = f.add_dimension(root, name, 1).unwrap_err();
        assert!(
            matches!(err, nc4::NcError::Invalid(_)),
            "{name:?} must be rejected as invalid, got {err}"
        );
    }
}

/// A group's child-name set is one namespace across sub-groups and
/// variables.
#[test]
fn child_names_unique_across_kinds() {
    let (_dir, path) = scratch("dups.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "x", 4).unwrap();
    f.add_group(root, "payload").unwrap();
    let err = f
        .add_variable(root, "payload", DType::Int, &["x"])
        .unwrap_err();
    assert!(matches!(err, nc4::NcError::Invalid(_)));
    let err = f.add_group(root, "payload").unwrap_err();
    assert!(matches!(err, nc4::NcError::Invalid(_)));
}

/// Dimensions occupy their own per-group namespace: a same-name variable is
/// the coordinate variable, not a clash, and duplicate dimensions fail.
#[test]
fn dimension_namespace() {
    let (_dir, path) = scratch("dimns.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "t", 3).unwrap();
    f.add_variable(root, "t", DType::Double, &["t"]).unwrap();
    let err = f.add_dimension(root, "t", 5).unwrap_err();
    assert!(matches!(err, nc4::NcError::Invalid(_)));
}

/// A dimension name resolves through ancestor groups, nearest first.
#[test]
fn dimension_resolution_walks_ancestors() {
    let (_dir, path) = scratch("resolve.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "x", 10).unwrap();
    let inner = f.add_group(root, "inner").unwrap();
    let shadow = f.add_dimension(inner, "x", 2).unwrap();
    let v = f.add_variable(inner, "v", DType::Float, &["x"]).unwrap();
    assert_eq!(f.find_dimension(inner, "x"), Some(shadow));
    // Nearest declaration wins: the variable is 2 long, not 10.
    f.end_define().unwrap();
    f.write(v, Some(&[0]), &Value::from(vec![0.0f32, 1.0]))
        .unwrap();
    f.close().unwrap();
}

/// Unknown dimension names fail naming the group.
#[test]
fn unknown_dimension_rejected() {
    let (_dir, path) = scratch("nodim.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    let err = f.add_variable(root, "v", DType::Int, &["ghost"]).unwrap_err();
    let text = err.to_string();
    assert!(
        text.contains("ghost") && text.contains('/'),
        "error must name the missing dimension and the group: {text}"
    );
}

/// Attribute names are validated and unique per object.
#[test]
fn attribute_names() {
    let (_dir, path) = scratch("attrs.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_group_attr(root, "title", Value::from("test run")).unwrap();
    let err = f
        .add_group_attr(root, "title", Value::from("again"))
        .unwrap_err();
    assert!(matches!(err, nc4::NcError::Invalid(_)));
    let err = f.add_group_attr(root, "9bad", Value::from(1i32)).unwrap_err();
    assert!(matches!(err, nc4::NcError::Invalid(_)));
}
