//! E2E: dimension-scale synthesis at end_define.
//!
//! A dimension without a coordinate variable gets a hidden zero-filled
//! float32 dataset carrying `CLASS`/`NAME` attributes with the canonical
//! placeholder text; referring variables get `DIMENSION_LIST` rows pointing
//! at the scale through the file-wide heap.

use nc4::{CreateOpts, DType, NcFile, Value};

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn phantom_dimension_gets_hidden_scale() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scale.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    let x = f.add_dimension(root, "x", 3).unwrap();
    let v = f.add_variable(root, "v", DType::Float, &["x"]).unwrap();
    f.end_define().unwrap();
    f.write(v, Some(&[0]), &Value::from(vec![9.0f32, 8.0, 7.0]))
        .unwrap();
    f.close().unwrap();

    // The hidden scale dataset was zero-filled automatically.
    let scale_recs = f.scale_chunk_records(x).expect("scale exists");
    assert_eq!(scale_recs.len(), 1);
    let rec = &scale_recs[0];
    assert!(rec.written, "end_define wrote the scale chunk");
    assert_eq!(rec.size, 12, "three float32 zeros");

    let bytes = std::fs::read(&path).unwrap();
    let raw = &bytes[rec.addr as usize..(rec.addr + rec.size) as usize];
    for k in 0..3 {
        let cell = f32::from_le_bytes(raw[k * 4..k * 4 + 4].try_into().unwrap());
        assert_eq!(cell, 0.0, "scale element {k}");
    }

    // Convention attributes, byte-for-byte.
    let meta = &bytes[..f.metadata_size() as usize];
    assert!(contains(meta, b"DIMENSION_SCALE"), "CLASS payload");
    assert!(
        contains(
            meta,
            b"This is a netCDF dimension but not a netCDF variable.         3"
        ),
        "NAME placeholder with the length right-aligned in ten columns"
    );
    assert!(contains(meta, b"DIMENSION_LIST"), "variable references its dim");
    assert!(contains(meta, b"REFERENCE_LIST"), "dim references its variable");

    // The DIMENSION_LIST row resolves to the scale's header address through
    // the file-wide heap.
    let heap = f.heap_addr();
    assert_ne!(heap, 0, "file-wide heap present");
    let scale_addr = f.scale_header_addr(x).expect("scale placed");
    let heap_region = &meta[heap as usize..];
    assert!(
        contains(heap_region, &scale_addr.to_le_bytes()),
        "heap row holds the scale reference"
    );
}

#[test]
fn coordinate_variable_is_its_own_scale() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coord.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    let t = f.add_dimension(root, "t", 2).unwrap();
    let tv = f.add_variable(root, "t", DType::Double, &["t"]).unwrap();
    f.end_define().unwrap();
    f.write(tv, Some(&[0]), &Value::from(vec![0.5f64, 1.5]))
        .unwrap();
    f.close().unwrap();

    // The coordinate variable doubles as the scale dataset.
    assert_eq!(f.scale_header_addr(t), Some(f.var_header_addr(tv)));

    let bytes = std::fs::read(&path).unwrap();
    let meta = &bytes[..f.metadata_size() as usize];
    assert!(contains(meta, b"DIMENSION_SCALE"));
    assert!(
        !contains(meta, b"This is a netCDF dimension"),
        "no placeholder when a coordinate variable exists"
    );
    assert!(
        !contains(meta, b"REFERENCE_LIST"),
        "skipped when the only referrer is the coordinate variable"
    );
    assert!(
        !contains(meta, b"DIMENSION_LIST"),
        "skipped on a rank-1 coordinate variable"
    );
}
