// Unit tests for src/gheap.rs — GCOL global heap collections.

use nc4::gheap::GlobalHeap;
use nc4::sink::ByteSink;

fn formatted(heap: &GlobalHeap) -> Vec<u8> {
    let mut sink = ByteSink::new();
    heap.format(&mut sink);
    sink.bytes().to_vec()
}

/// Collection header: signature, version 1, three reserved bytes, total
/// collection size as a little-endian u64.
#[test]
fn collection_header_layout() {
    let mut heap = GlobalHeap::new();
    heap.put(b"abc");
    let bytes = formatted(&heap);
    assert_eq!(&bytes[0..4], b"GCOL");
    assert_eq!(bytes[4], 1);
    assert_eq!(&bytes[5..8], &[0, 0, 0]);
    let size = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
    assert_eq!(size, bytes.len() as u64, "size field covers the collection");
    assert_eq!(size, heap.size());
}

/// Item entries carry 1-based index, zero refcount, byte size, and the
/// payload padded to a multiple of eight.
#[test]
fn item_entry_layout() {
    let mut heap = GlobalHeap::new();
    assert_eq!(heap.put(b"abc"), 1);
    let bytes = formatted(&heap);
    let item = &bytes[16..];
    assert_eq!(u16::from_le_bytes(item[0..2].try_into().unwrap()), 1);
    assert_eq!(u16::from_le_bytes(item[2..4].try_into().unwrap()), 0);
    assert_eq!(u64::from_le_bytes(item[8..16].try_into().unwrap()), 3);
    assert_eq!(&item[16..19], b"abc");
    assert_eq!(&item[19..24], &[0; 5], "payload padded to 8");
}

/// The collection closes with a null object of index 0 whose size field is
/// the remaining free space (its own 16-byte header).
#[test]
fn closing_null_object() {
    let mut heap = GlobalHeap::new();
    heap.put(b"12345678");
    let bytes = formatted(&heap);
    let tail = &bytes[bytes.len() - 16..];
    assert_eq!(u16::from_le_bytes(tail[0..2].try_into().unwrap()), 0);
    assert_eq!(u64::from_le_bytes(tail[8..16].try_into().unwrap()), 16);
}

/// Indices restart at 1 after clear, and re-populating in the same order
/// reproduces the exact same bytes — the property the two-pass metadata
/// layout depends on.
#[test]
fn clear_and_repopulate_is_byte_stable() {
    let mut heap = GlobalHeap::new();
    heap.put(b"a");
    heap.put(b"bb");
    let first = formatted(&heap);
    heap.clear();
    assert_eq!(heap.item_count(), 0);
    assert_eq!(heap.put(b"a"), 1);
    assert_eq!(heap.put(b"bb"), 2);
    assert_eq!(formatted(&heap), first);
}

/// Zero-length items still occupy an entry header.
#[test]
fn empty_item_has_header_only() {
    let mut heap = GlobalHeap::new();
    heap.put(b"");
    // header + empty item entry + null object
    assert_eq!(heap.size(), 16 + 16 + 16);
    assert_eq!(formatted(&heap).len() as u64, heap.size());
}
