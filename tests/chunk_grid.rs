// Chunk-grid arithmetic and payload shape validation.

use nc4::{CreateOpts, DType, NcFile, NcError, Value, VarOpts};

fn scratch(name: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(name);
    (dir, path)
}

fn grid_file(path: &std::path::Path) -> (NcFile, nc4::VarId) {
    let mut f = NcFile::create(path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "y", 7).unwrap();
    f.add_dimension(root, "x", 5).unwrap();
    let v = f
        .add_variable_with(
            root,
            "v",
            DType::Int,
            &["y", "x"],
            &VarOpts {
                chunks: Some(vec![4, 2]),
                ..VarOpts::default()
            },
        )
        .unwrap();
    (f, v)
}

/// 7×5 with 4×2 chunks: ceil(7/4) × ceil(5/2) = 2×3 = 6 chunks, enumerated
/// row-major with the last axis fastest.
#[test]
fn row_major_chunk_table() {
    let (_dir, path) = scratch("grid.nc");
    let (f, v) = grid_file(&path);
    let starts: Vec<Vec<u64>> = f
        .chunk_records(v)
        .iter()
        .map(|c| c.start.clone())
        .collect();
    assert_eq!(
        starts,
        vec![
            vec![0, 0],
            vec![0, 2],
            vec![0, 4],
            vec![4, 0],
            vec![4, 2],
            vec![4, 4],
        ]
    );
}

/// Start indices must be element-wise multiples of the chunk shape and
/// inside the variable extent.
#[test]
fn start_index_validation() {
    let (_dir, path) = scratch("starts.nc");
    let (mut f, v) = grid_file(&path);
    f.end_define().unwrap();
    let interior = Value::from(vec![0i32; 8]).with_shape(vec![4, 2]).unwrap();
    let err = f.write(v, Some(&[1, 0]), &interior).unwrap_err();
    assert!(matches!(err, NcError::Shape(_)), "non-multiple start: {err}");
    let err = f.write(v, Some(&[8, 0]), &interior).unwrap_err();
    assert!(matches!(err, NcError::Shape(_)), "out of range: {err}");
    let err = f.write(v, Some(&[0]), &interior).unwrap_err();
    assert!(matches!(err, NcError::Shape(_)), "rank mismatch: {err}");
    f.write(v, Some(&[0, 0]), &interior).unwrap();
}

/// Trailing-edge chunks accept the clipped rectangle; interior chunks do
/// not.
#[test]
fn edge_lengths() {
    let (_dir, path) = scratch("edges.nc");
    let (mut f, v) = grid_file(&path);
    f.end_define().unwrap();
    // Bottom edge: rows 4..7 → 3×2.
    let edge = Value::from(vec![0i32; 6]).with_shape(vec![3, 2]).unwrap();
    f.write(v, Some(&[4, 0]), &edge).unwrap();
    // Right edge: 4×1.
    let right = Value::from(vec![0i32; 4]).with_shape(vec![4, 1]).unwrap();
    f.write(v, Some(&[0, 4]), &right).unwrap();
    // An interior chunk must not be short.
    let short = Value::from(vec![0i32; 6]).with_shape(vec![3, 2]).unwrap();
    let err = f.write(v, Some(&[0, 0]), &short).unwrap_err();
    assert!(matches!(err, NcError::Shape(_)), "{err}");
}

/// Linear mode takes a flat payload of chunk volume (interior) or the
/// clipped remainder volume (edge), and nothing in between.
#[test]
fn linear_mode_volumes() {
    let (_dir, path) = scratch("linear.nc");
    let (mut f, v) = grid_file(&path);
    f.end_define().unwrap();
    f.write_linear(v, Some(&[0, 0]), &Value::from(vec![0i32; 8]))
        .unwrap();
    // Corner chunk at (4,4): 3×1 remainder.
    f.write_linear(v, Some(&[4, 4]), &Value::from(vec![0i32; 3]))
        .unwrap();
    let err = f
        .write_linear(v, Some(&[0, 2]), &Value::from(vec![0i32; 5]))
        .unwrap_err();
    assert!(matches!(err, NcError::Shape(_)), "{err}");
}

/// Declared element type and observed payload tag must agree.
#[test]
fn type_mismatch_rejected() {
    let (_dir, path) = scratch("types.nc");
    let (mut f, v) = grid_file(&path);
    f.end_define().unwrap();
    let floats = Value::from(vec![0f32; 8]).with_shape(vec![4, 2]).unwrap();
    let err = f.write(v, Some(&[0, 0]), &floats).unwrap_err();
    assert!(matches!(err, NcError::Shape(_)), "{err}");
}

/// Declaration-time chunk invariants: rank match, 1..=dim bounds,
/// compression only with chunks, never on scalars or strings.
#[test]
fn declaration_invariants() {
    let (_dir, path) = scratch("decl.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "x", 5).unwrap();

    let bad_rank = VarOpts {
        chunks: Some(vec![2, 2]),
        ..VarOpts::default()
    };
    assert!(matches!(
        f.add_variable_with(root, "a", DType::Int, &["x"], &bad_rank),
        Err(NcError::Invalid(_))
    ));

    let oversized = VarOpts {
        chunks: Some(vec![6]),
        ..VarOpts::default()
    };
    assert!(matches!(
        f.add_variable_with(root, "b", DType::Int, &["x"], &oversized),
        Err(NcError::Invalid(_))
    ));

    let contiguous_deflate = VarOpts {
        deflate_level: 5,
        ..VarOpts::default()
    };
    assert!(matches!(
        f.add_variable_with(root, "c", DType::Int, &["x"], &contiguous_deflate),
        Err(NcError::Invalid(_))
    ));

    let scalar_chunks = VarOpts {
        chunks: Some(vec![1]),
        ..VarOpts::default()
    };
    assert!(matches!(
        f.add_variable_with(root, "d", DType::Int, &[], &scalar_chunks),
        Err(NcError::Invalid(_))
    ));

    let string_deflate = VarOpts {
        chunks: Some(vec![2]),
        deflate_level: 1,
        ..VarOpts::default()
    };
    assert!(matches!(
        f.add_variable_with(root, "e", DType::VarStr, &["x"], &string_deflate),
        Err(NcError::Invalid(_))
    ));

    let level_range = VarOpts {
        chunks: Some(vec![2]),
        deflate_level: 10,
        ..VarOpts::default()
    };
    assert!(matches!(
        f.add_variable_with(root, "g", DType::Int, &["x"], &level_range),
        Err(NcError::Invalid(_))
    ));
}

/// Fill values must be scalars of the declared type.
#[test]
fn fill_value_invariants() {
    let (_dir, path) = scratch("fill.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "x", 2).unwrap();
    let wrong_type = VarOpts {
        fill: Some(Value::from(1.5f64)),
        ..VarOpts::default()
    };
    assert!(matches!(
        f.add_variable_with(root, "a", DType::Int, &["x"], &wrong_type),
        Err(NcError::Invalid(_))
    ));
    let non_scalar = VarOpts {
        fill: Some(Value::from(vec![1i32, 2])),
        ..VarOpts::default()
    };
    assert!(matches!(
        f.add_variable_with(root, "b", DType::Int, &["x"], &non_scalar),
        Err(NcError::Invalid(_))
    ));
    let ok = VarOpts {
        fill: Some(Value::from(7i32)),
        ..VarOpts::default()
    };
    f.add_variable_with(root, "c", DType::Int, &["x"], &ok)
        .unwrap();
}
