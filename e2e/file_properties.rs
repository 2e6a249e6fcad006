//! E2E: file-wide invariants.
//!
//! Signature and checksum discipline, end-of-file accounting, and
//! write-order invariance of chunk content. These drive both the
//! convention layer and the bare HDF5 layer.

use nc4::{
    jenkins_lookup3, CreateOpts, DType, Hdf5File, NcFile, Value, VarOpts, SUPERBLOCK_SIGNATURE,
};

fn fixed_time() -> CreateOpts {
    CreateOpts {
        overwrite: false,
        mod_time_ms: 1_700_000_000_000,
    }
}

// ---------------------------------------------------------------------------
// Superblock
// ---------------------------------------------------------------------------

/// Signature, version, checksum over the leading 44 bytes, and the
/// end-of-file / root-header address fields.
#[test]
fn superblock_fields_and_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sb.nc");
    let mut f = Hdf5File::create(&path, &fixed_time()).unwrap();
    let root = f.root();
    let ds = f
        .add_dataset(root, "s", DType::Long, 0, Some(vec![]), None, 0, None)
        .unwrap();
    f.end_define().unwrap();
    f.write_chunk(ds, None, &Value::from(-1i64), false).unwrap();
    f.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..8], &SUPERBLOCK_SIGNATURE);
    assert_eq!(bytes[8], 2, "superblock version 2");
    assert_eq!(bytes[9], 8, "offset size");
    assert_eq!(bytes[10], 8, "length size");

    let stored = u32::from_le_bytes(bytes[44..48].try_into().unwrap());
    assert_eq!(
        stored,
        jenkins_lookup3(&bytes[..44], 0),
        "superblock checksum covers the preceding bytes"
    );

    let ext = u64::from_le_bytes(bytes[20..28].try_into().unwrap());
    assert_eq!(ext, 48, "extension header follows the superblock");
    let eof = u64::from_le_bytes(bytes[28..36].try_into().unwrap());
    assert_eq!(eof, bytes.len() as u64, "EOF field matches the file size");
    assert_eq!(eof, f.eof_addr());
    let root_addr = u64::from_le_bytes(bytes[36..44].try_into().unwrap());
    assert_eq!(root_addr, f.group_header_addr(root));
    assert_eq!(root_addr % 8, 0, "object headers are 8-aligned");
}

// ---------------------------------------------------------------------------
// Object-header checksums
// ---------------------------------------------------------------------------

/// Every OHDR envelope ends with a Jenkins digest of the bytes before it.
#[test]
fn object_header_checksums_recompute() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ohdr.nc");
    let mut f = Hdf5File::create(&path, &fixed_time()).unwrap();
    let root = f.root();
    let g = f.add_group(root, "sub").unwrap();
    let ds = f
        .add_dataset(g, "v", DType::Int, 0, Some(vec![4]), None, 0, None)
        .unwrap();
    f.end_define().unwrap();
    f.write_chunk(ds, Some(&[0]), &Value::from(vec![1i32, 2, 3, 4]), false)
        .unwrap();
    f.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    for addr in [
        f.group_header_addr(root),
        f.group_header_addr(g),
        f.dataset_header_addr(ds),
    ] {
        let at = addr as usize;
        assert_eq!(&bytes[at..at + 4], b"OHDR", "signature at {addr}");
        assert_eq!(bytes[at + 4], 2, "header version");
        let flags = bytes[at + 5];
        let width = 1usize << (flags & 0b11);
        assert_ne!(flags & 0b0010_0000, 0, "times stored");
        // Signature, version, flags, four times, two phase-change values.
        let fixed = 4 + 1 + 1 + 16 + 4;
        let mut len_field = [0u8; 8];
        len_field[..width].copy_from_slice(&bytes[at + fixed..at + fixed + width]);
        let body = u64::from_le_bytes(len_field) as usize;
        let hashed = fixed + width + body;
        let stored =
            u32::from_le_bytes(bytes[at + hashed..at + hashed + 4].try_into().unwrap());
        assert_eq!(
            stored,
            jenkins_lookup3(&bytes[at..at + hashed], 0),
            "checksum at {addr}"
        );
    }
}

/// The attribute-info message counts attribute creation order only — the
/// other header messages must not inflate its maximum creation index.
#[test]
fn attribute_info_counts_attributes_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attrinfo.nc");
    let mut f = NcFile::create(&path, &fixed_time()).unwrap();
    let root = f.root();
    let v = f.add_variable(root, "s", DType::Int, &[]).unwrap();
    f.add_var_attr(v, "units", Value::from("K")).unwrap();
    f.add_var_attr(v, "valid_min", Value::from(0i32)).unwrap();
    f.end_define().unwrap();
    f.write(v, None, &Value::scalar_int(1)).unwrap();
    f.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let at = f.var_header_addr(v) as usize;
    assert_eq!(&bytes[at..at + 4], b"OHDR");
    let width = 1usize << (bytes[at + 5] & 0b11);
    let fixed = 4 + 1 + 1 + 16 + 4;
    let mut len_field = [0u8; 8];
    len_field[..width].copy_from_slice(&bytes[at + fixed..at + fixed + width]);
    let body_len = u64::from_le_bytes(len_field) as usize;

    // Walk the message envelopes to the attribute-info message (type 21).
    let mut off = at + fixed + width;
    let end = off + body_len;
    let mut seen = false;
    while off < end {
        let mtype = bytes[off];
        let msize = u16::from_le_bytes(bytes[off + 1..off + 3].try_into().unwrap()) as usize;
        let body = off + 6;
        if mtype == 21 {
            let max_index = u16::from_le_bytes(bytes[body + 2..body + 4].try_into().unwrap());
            assert_eq!(max_index, 2, "two attributes were created");
            seen = true;
        }
        off = body + msize;
    }
    assert!(seen, "attribute-info message present");
}

// ---------------------------------------------------------------------------
// Size accounting
// ---------------------------------------------------------------------------

/// For an uncompressed variable whose chunk sizes are 8-multiples, the sum
/// of chunk sizes equals the file size minus the metadata prefix.
#[test]
fn chunk_sizes_account_for_the_data_region() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sizes.nc");
    let mut f = NcFile::create(&path, &fixed_time()).unwrap();
    let root = f.root();
    f.add_dimension(root, "t", 6).unwrap();
    let v = f.add_variable(root, "t", DType::Double, &["t"]).unwrap();
    f.end_define().unwrap();
    f.write(v, Some(&[0]), &Value::from(vec![0.0f64; 6])).unwrap();
    f.close().unwrap();

    let file_len = std::fs::read(&path).unwrap().len() as u64;
    let data: u64 = f.chunk_records(v).iter().map(|r| r.size).sum();
    assert_eq!(data, 48);
    assert_eq!(
        file_len,
        f.metadata_size() + data,
        "metadata prefix ends exactly where raw data begins"
    );
}

// ---------------------------------------------------------------------------
// Determinism and write order
// ---------------------------------------------------------------------------

fn two_chunk_file(path: &std::path::Path, order: &[u64]) -> (NcFile, nc4::VarId) {
    let mut f = NcFile::create(path, &fixed_time()).unwrap();
    let root = f.root();
    f.add_dimension(root, "x", 8).unwrap();
    let opts = VarOpts {
        chunks: Some(vec![4]),
        ..VarOpts::default()
    };
    let v = f
        .add_variable_with(root, "x", DType::Int, &["x"], &opts)
        .unwrap();
    f.end_define().unwrap();
    for &start in order {
        let base = start as i32;
        let data: Vec<i32> = (base..base + 4).collect();
        f.write(v, Some(&[start]), &Value::from(data)).unwrap();
    }
    f.close().unwrap();
    (f, v)
}

/// Identical definitions and write order produce byte-identical files when
/// the modification time is pinned.
#[test]
fn same_order_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.nc");
    let b = dir.path().join("b.nc");
    two_chunk_file(&a, &[0, 4]);
    two_chunk_file(&b, &[0, 4]);
    assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
}

/// Reordering chunk writes moves chunk positions but not chunk content or
/// metadata size.
#[test]
fn write_order_does_not_change_content() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("fwd.nc");
    let b = dir.path().join("rev.nc");
    let (fa, va) = two_chunk_file(&a, &[0, 4]);
    let (fb, vb) = two_chunk_file(&b, &[4, 0]);

    assert_eq!(fa.metadata_size(), fb.metadata_size());
    let bytes_a = std::fs::read(&a).unwrap();
    let bytes_b = std::fs::read(&b).unwrap();
    assert_eq!(bytes_a.len(), bytes_b.len());

    let recs_a = fa.chunk_records(va);
    let recs_b = fb.chunk_records(vb);
    for (ra, rb) in recs_a.iter().zip(recs_b) {
        assert_eq!(ra.size, rb.size);
        let ca = &bytes_a[ra.addr as usize..(ra.addr + ra.size) as usize];
        let cb = &bytes_b[rb.addr as usize..(rb.addr + rb.size) as usize];
        assert_eq!(ca, cb, "chunk content is position-invariant");
    }
    // The swapped order swaps the on-disk positions.
    assert_eq!(recs_a[0].addr, recs_b[1].addr);
    assert_eq!(recs_a[1].addr, recs_b[0].addr);
}
