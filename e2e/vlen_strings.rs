//! E2E: 1-D variable-length strings.
//!
//! The strings of one chunk live in their own GCOL collection written
//! immediately before the chunk's reference list; each reference is a
//! 16-byte `(length, heap address, index)` triple, and following the
//! references must reproduce the strings in row-major order.

use nc4::{CreateOpts, DType, NcFile, Value};

/// Walks a GCOL collection and returns the payload of the item with the
/// given 1-based index.
fn heap_item(bytes: &[u8], collection: u64, index: u32) -> Vec<u8> {
    let base = collection as usize;
    assert_eq!(&bytes[base..base + 4], b"GCOL", "collection signature");
    assert_eq!(bytes[base + 4], 1, "collection version");
    let total = u64::from_le_bytes(bytes[base + 8..base + 16].try_into().unwrap()) as usize;
    let mut off = base + 16;
    while off < base + total {
        let idx = u16::from_le_bytes(bytes[off..off + 2].try_into().unwrap());
        let size = u64::from_le_bytes(bytes[off + 8..off + 16].try_into().unwrap()) as usize;
        if idx == 0 {
            break;
        }
        if u32::from(idx) == index {
            return bytes[off + 16..off + 16 + size].to_vec();
        }
        off += 16 + size.div_ceil(8) * 8;
    }
    panic!("heap item {index} not found in collection at {collection}");
}

#[test]
fn vlen_strings_roundtrip_through_heap() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("names.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "t", 3).unwrap();
    let v = f
        .add_variable(root, "name", DType::VarStr, &["t"])
        .unwrap();
    f.end_define().unwrap();
    let words = ["a", "bb", "ccc"];
    f.write(v, Some(&[0]), &Value::var_strings(&words)).unwrap();
    f.close().unwrap();

    let recs = f.chunk_records(v);
    assert_eq!(recs.len(), 1);
    let rec = &recs[0];
    assert_eq!(rec.size, 3 * 16, "three 16-byte references");

    let bytes = std::fs::read(&path).unwrap();
    let refs = &bytes[rec.addr as usize..(rec.addr + rec.size) as usize];
    for (row, word) in words.iter().enumerate() {
        let cell = &refs[row * 16..row * 16 + 16];
        let len = u32::from_le_bytes(cell[0..4].try_into().unwrap());
        let collection = u64::from_le_bytes(cell[4..12].try_into().unwrap());
        let index = u32::from_le_bytes(cell[12..16].try_into().unwrap());
        assert_eq!(len as usize, word.len(), "row {row} length");
        assert_eq!(index, row as u32 + 1, "indices are 1-based and ordered");
        let item = heap_item(&bytes, collection, index);
        assert_eq!(item, word.as_bytes(), "row {row} payload");
        assert!(
            collection < rec.addr,
            "the collection sits just before the reference list"
        );
    }
}

/// The heap's three items have sizes 1, 2 and 3 — nothing is padded into
/// the payload lengths themselves.
#[test]
fn heap_item_sizes_are_exact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sizes.nc");
    let mut f = NcFile::create(&path, &CreateOpts::default()).unwrap();
    let root = f.root();
    f.add_dimension(root, "t", 3).unwrap();
    let v = f
        .add_variable(root, "name", DType::VarStr, &["t"])
        .unwrap();
    f.end_define().unwrap();
    f.write(v, Some(&[0]), &Value::var_strings(&["a", "bb", "ccc"]))
        .unwrap();
    f.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let rec = &f.chunk_records(v)[0];
    let collection =
        u64::from_le_bytes(bytes[rec.addr as usize + 4..rec.addr as usize + 12].try_into().unwrap());
    for (index, want) in [(1u32, 1usize), (2, 2), (3, 3)] {
        assert_eq!(heap_item(&bytes, collection, index).len(), want);
    }
}
