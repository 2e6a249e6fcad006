//! E2E: 2-D float32 variable, 4×6, stored as a single 4×6 chunk without
//! compression. The chunk must land as 96 bytes of row-major little-endian
//! floats.

use nc4::{CreateOpts, DType, NcFile, Value, VarOpts};

#[test]
fn single_full_chunk_float32() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rect.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "y", 4).unwrap();
    f.add_dimension(root, "x", 6).unwrap();
    let opts = VarOpts {
        chunks: Some(vec![4, 6]),
        ..VarOpts::default()
    };
    let v = f
        .add_variable_with(root, "grid", DType::Float, &["y", "x"], &opts)
        .unwrap();
    f.end_define().unwrap();

    // value[i][j] = i*6 + j, which is the row-major flat index.
    let data: Vec<f32> = (0..24).map(|k| k as f32).collect();
    let value = Value::from(data.clone()).with_shape(vec![4, 6]).unwrap();
    f.write(v, Some(&[0, 0]), &value).unwrap();
    f.close().unwrap();

    let recs = f.chunk_records(v);
    assert_eq!(recs.len(), 1, "one chunk record");
    let rec = &recs[0];
    assert_eq!(rec.size, 96, "4*6 float32 elements");
    assert_eq!(rec.addr % 8, 0);

    let bytes = std::fs::read(&path).unwrap();
    let raw = &bytes[rec.addr as usize..(rec.addr + rec.size) as usize];
    for (k, expected) in data.iter().enumerate() {
        let cell = f32::from_le_bytes(raw[k * 4..k * 4 + 4].try_into().unwrap());
        assert_eq!(cell, *expected, "element {k}");
    }
}
