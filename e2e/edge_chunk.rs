//! E2E: trailing-edge chunk padding.
//!
//! Dimension 7, chunk 4: the second chunk covers indices 4..8 but only
//! three elements exist, so the uncompressed chunk rectangle is completed
//! with the 0x77 fill byte.

use nc4::{CreateOpts, DType, NcFile, Value, VarOpts};

#[test]
fn edge_chunk_pads_with_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edge.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "x", 7).unwrap();
    let opts = VarOpts {
        chunks: Some(vec![4]),
        ..VarOpts::default()
    };
    let v = f
        .add_variable_with(root, "v", DType::Int, &["x"], &opts)
        .unwrap();
    f.end_define().unwrap();
    f.write(v, Some(&[0]), &Value::from(vec![1i32, 2, 3, 4]))
        .unwrap();
    f.write(v, Some(&[4]), &Value::from(vec![5i32, 6, 7]))
        .unwrap();
    f.close().unwrap();

    let recs = f.chunk_records(v);
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].size, 16, "interior chunk is the full rectangle");
    assert_eq!(recs[1].size, 16, "edge chunk is padded to the rectangle");

    let bytes = std::fs::read(&path).unwrap();
    let edge = &bytes[recs[1].addr as usize..(recs[1].addr + 16) as usize];
    for (k, want) in [5i32, 6, 7].iter().enumerate() {
        let cell = i32::from_le_bytes(edge[k * 4..k * 4 + 4].try_into().unwrap());
        assert_eq!(cell, *want, "edge element {k}");
    }
    assert_eq!(
        &edge[12..16],
        &[0x77; 4],
        "trailing slot filled with the pad sentinel"
    );
}

/// The same padding applies per row of a 2-D edge chunk.
#[test]
fn two_dimensional_edge_rows_pad_per_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edge2d.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "y", 3).unwrap();
    f.add_dimension(root, "x", 3).unwrap();
    let opts = VarOpts {
        chunks: Some(vec![2, 2]),
        ..VarOpts::default()
    };
    let v = f
        .add_variable_with(root, "v", DType::Ubyte, &["y", "x"], &opts)
        .unwrap();
    f.end_define().unwrap();
    // Corner chunk at (2,2): a single element in a 2×2 rectangle.
    let one = Value::from(vec![0xAAu8]).with_shape(vec![1, 1]).unwrap();
    f.write(v, Some(&[2, 2]), &one).unwrap();
    for (start, data) in [
        ([0u64, 0u64], vec![1u8, 2, 3, 4]),
        ([0, 2], vec![5u8, 6]),
        ([2, 0], vec![7u8, 8]),
    ] {
        let shape = vec![
            if start[0] == 2 { 1 } else { 2 },
            if start[1] == 2 { 1 } else { 2 },
        ];
        let value = Value::from(data).with_shape(shape).unwrap();
        f.write(v, Some(&start), &value).unwrap();
    }
    f.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let corner = &f.chunk_records(v)[3];
    assert_eq!(corner.size, 4);
    let raw = &bytes[corner.addr as usize..(corner.addr + 4) as usize];
    assert_eq!(
        raw,
        &[0xAA, 0x77, 0x77, 0x77],
        "data row padded, out-of-extent row fully padded"
    );
}
