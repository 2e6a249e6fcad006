//! E2E: chunked storage with DEFLATE level 5.
//!
//! A 10×10 int32 variable with 5×5 chunks: all four chunks must land at
//! distinct 8-aligned addresses, each no larger than the raw chunk
//! rectangle, and each must inflate back to the original little-endian
//! bytes with a standard DEFLATE decoder.

use std::io::Read;

use nc4::{CreateOpts, DType, NcFile, Value, VarOpts};

fn chunk_payload(ci: u64, cj: u64) -> Vec<i32> {
    (0..25).map(|k| (ci * 1000 + cj * 100) as i32 + k).collect()
}

#[test]
fn four_chunks_deflate_level_five() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("comp.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "y", 10).unwrap();
    f.add_dimension(root, "x", 10).unwrap();
    let opts = VarOpts {
        chunks: Some(vec![5, 5]),
        deflate_level: 5,
        ..VarOpts::default()
    };
    let v = f
        .add_variable_with(root, "field", DType::Int, &["y", "x"], &opts)
        .unwrap();
    f.end_define().unwrap();

    for ci in 0..2u64 {
        for cj in 0..2u64 {
            let value = Value::from(chunk_payload(ci, cj))
                .with_shape(vec![5, 5])
                .unwrap();
            f.write(v, Some(&[ci * 5, cj * 5]), &value).unwrap();
        }
    }
    f.close().unwrap();

    let recs = f.chunk_records(v);
    assert_eq!(recs.len(), 4);
    let mut addrs: Vec<u64> = recs.iter().map(|r| r.addr).collect();
    addrs.sort_unstable();
    addrs.dedup();
    assert_eq!(addrs.len(), 4, "distinct chunk addresses");
    for rec in recs {
        assert!(rec.addr != 0, "address assigned");
        assert_eq!(rec.addr % 8, 0, "8-aligned");
        assert!(
            rec.size <= 5 * 5 * 4,
            "compressed size {} within the raw rectangle",
            rec.size
        );
        assert!(rec.size > 0);
    }

    // Inflating each chunk yields the original row-major bytes.
    let bytes = std::fs::read(&path).unwrap();
    for (k, rec) in recs.iter().enumerate() {
        let (ci, cj) = ((k as u64) / 2, (k as u64) % 2);
        let packed = &bytes[rec.addr as usize..(rec.addr + rec.size) as usize];
        let mut raw = Vec::new();
        flate2::read::DeflateDecoder::new(packed)
            .read_to_end(&mut raw)
            .unwrap_or_else(|e| panic!("chunk {k} does not inflate: {e}"));
        assert_eq!(raw.len(), 100, "chunk {k} inflates to the full rectangle");
        let expected: Vec<u8> = chunk_payload(ci, cj)
            .iter()
            .flat_map(|x| x.to_le_bytes())
            .collect();
        assert_eq!(raw, expected, "chunk {k} content");
    }
}
