// Value construction: tags, shapes, and ingress validation.

use nc4::{Data, Value};

/// Scalar constructors produce rank-0 values with one element.
#[test]
fn scalar_constructors() {
    let v = Value::scalar_int(42);
    assert_eq!(v.rank(), 0);
    assert_eq!(v.elem_count(), 1);
    assert!(matches!(v.data(), Data::Int(x) if x == &[42]));

    assert!(matches!(Value::scalar_ubyte(7).data(), Data::Ubyte(_)));
    assert!(matches!(Value::scalar_byte(-7).data(), Data::Byte(_)));
    assert!(matches!(Value::scalar_short(-1).data(), Data::Short(_)));
    assert!(matches!(Value::scalar_long(1 << 40).data(), Data::Long(_)));
    assert!(matches!(Value::scalar_float(0.5).data(), Data::Float(_)));
    assert!(matches!(Value::scalar_double(0.25).data(), Data::Double(_)));

    let s = Value::scalar_str("hello");
    assert_eq!(s.rank(), 0);
    assert!(matches!(s.data(), Data::Str(_)));
}

/// The `From` impls are shorthand for the scalar and rank-1 constructors.
#[test]
fn from_impls_match_constructors() {
    assert!(matches!(Value::from(42i32).data(), Data::Int(x) if x == &[42]));
    assert!(matches!(Value::from("hi").data(), Data::Str(_)));
    let v = Value::from(vec![1.0f64, 2.0, 3.0]);
    assert_eq!(v.shape(), &[3]);
    let w = Value::from(&[1i16, 2][..]);
    assert_eq!(w.shape(), &[2]);
}

/// `from_shape` checks the element count against the shape product.
#[test]
fn from_shape_checks_volume() {
    let cube = Value::from_shape(Data::Ubyte(vec![0; 24]), vec![2, 3, 4]).unwrap();
    assert_eq!(cube.rank(), 3);
    assert_eq!(cube.elem_count(), 24);
    assert!(Value::from_shape(Data::Ubyte(vec![0; 24]), vec![5, 5]).is_err());
}

/// Re-shaping a flat value keeps the element count honest too.
#[test]
fn with_shape_checks_volume() {
    let grid = Value::from(vec![0i32; 12]).with_shape(vec![3, 4]).unwrap();
    assert_eq!(grid.shape(), &[3, 4]);
    assert!(Value::from(vec![0i32; 12]).with_shape(vec![5]).is_err());
}

/// String helpers choose between fixed and variable-length tags.
#[test]
fn string_flavors() {
    let fixed = Value::strings(&["a", "bb"]);
    assert!(matches!(fixed.data(), Data::Str(_)));
    assert_eq!(fixed.max_str_len(), 2);
    let vlen = Value::var_strings(&["a", "bbbb"]);
    assert!(matches!(vlen.data(), Data::VarStr(_)));
    assert_eq!(vlen.max_str_len(), 4);
    assert_eq!(vlen.shape(), &[2]);
}
