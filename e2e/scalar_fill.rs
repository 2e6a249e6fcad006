//! E2E: scalar int32 variable with a fill value.
//!
//! One root-group variable "s" of type int32, no dimensions, fill 7; the
//! scalar 42 is written with no start indices. The output must be a valid
//! HDF5 stream whose single contiguous data block holds the value.

use nc4::{CreateOpts, DType, NcFile, Value, VarOpts, SUPERBLOCK_SIGNATURE};

#[test]
fn scalar_int32_with_fill() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scalar.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    let opts = VarOpts {
        fill: Some(Value::from(7i32)),
        ..VarOpts::default()
    };
    let v = f
        .add_variable_with(root, "s", DType::Int, &[], &opts)
        .unwrap();
    f.end_define().unwrap();
    f.write(v, None, &Value::from(42i32)).unwrap();
    f.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..8], &SUPERBLOCK_SIGNATURE, "HDF5 signature");

    // Contiguous storage: exactly one chunk record of one element.
    let recs = f.chunk_records(v);
    assert_eq!(recs.len(), 1);
    let rec = &recs[0];
    assert!(rec.written);
    assert_eq!(rec.size, 4, "element byte length is 4");
    assert_eq!(rec.addr % 8, 0, "raw data is 8-aligned");
    assert!(rec.addr >= f.metadata_size());

    let cell = &bytes[rec.addr as usize..rec.addr as usize + 4];
    assert_eq!(
        i32::from_le_bytes(cell.try_into().unwrap()),
        42,
        "reading \"s\" yields 42"
    );
    assert_eq!(bytes.len() as u64, f.eof_addr());

    // The fill message carries the typed fill bytes inside the metadata
    // prefix.
    let meta = &bytes[..f.metadata_size() as usize];
    assert!(
        meta.windows(4).any(|w| w == 7i32.to_le_bytes()),
        "fill value 7 appears in the metadata"
    );
}
