//! `roundtrip` 集成测试：验证 `pack` → `unpack` 在公开 API 下保持值、共享与环结构。
//!
//! # 测试目标（Why）
//! - 标量、字符串、嵌套表在往返后结构相等；
//! - 同一张表出现多次时，解码结果仍是同一实例；环结构可以终止并被还原；
//! - 零拷贝解码得到的字符串切片指向输入缓冲。
//!
//! # 结构安排（How）
//! - 以 `roundtrip` 帮助函数固定“编码成功、解码成功、数量一致”的前置断言；
//! - 共享与环结构使用 `Table::ptr_eq` 验证身份，测试结束时 `clear` 断环。

use tabcodec_core::{Bytes, Codec, Number, Table, Value, pack, unpack};

fn roundtrip(values: &[Value]) -> Vec<Value> {
    let bytes = pack(values).expect("编码应成功");
    let decoded = unpack(&bytes).expect("解码应成功");
    assert_eq!(decoded.len(), values.len());
    decoded
}

fn table(value: &Value) -> Table {
    value.as_table().expect("期望表").clone()
}

#[test]
fn mixed_envelope_roundtrips() {
    let config = Table::array([1, 2]);
    config.set("x", 9).expect("字符串键");
    let values = vec![
        Value::Nil,
        Value::from(true),
        Value::from(false),
        Value::from(42),
        Value::from("hi"),
        Value::from(config),
    ];
    let decoded = roundtrip(&values);
    for (original, back) in values.iter().zip(&decoded) {
        assert!(original.deep_eq(back), "{original:?} 与 {back:?} 不一致");
    }
    let back = table(&decoded[5]);
    assert_eq!(back.get(1), Some(Value::from(1)));
    assert_eq!(back.get(2), Some(Value::from(2)));
    assert_eq!(back.get("x"), Some(Value::from(9)));
}

#[test]
fn empty_envelope_is_two_bytes() {
    let bytes = pack(&[]).expect("空调用");
    assert_eq!(bytes.len(), 2);
    assert_eq!(unpack(&bytes).expect("解码"), Vec::<Value>::new());
}

#[test]
fn numbers_keep_subtype_and_value() {
    let samples = [
        Value::from(1),
        Value::from(-1),
        Value::from(i64::MAX),
        Value::from(i64::MIN),
        Value::from(0.5),
        Value::from(-3.75),
        Value::from(0.1),
        Value::from(1e300),
        Value::from(f64::INFINITY),
        Value::from(f64::NEG_INFINITY),
    ];
    let decoded = roundtrip(&samples);
    assert_eq!(decoded, samples);
    assert!(matches!(decoded[1], Value::Number(Number::Integer(-1))));
    assert!(matches!(decoded[6], Value::Number(Number::Float(f)) if f == 0.1));
}

#[test]
fn nan_survives_as_float() {
    let decoded = roundtrip(&[Value::from(f64::NAN)]);
    assert!(matches!(decoded[0], Value::Number(Number::Float(f)) if f.is_nan()));
}

#[test]
fn integral_floats_decode_as_equal_numbers() {
    let decoded = roundtrip(&[Value::from(3.0), Value::from(-0.0)]);
    assert_eq!(decoded[0], Value::from(3));
    assert_eq!(decoded[1], Value::from(0));
}

#[test]
fn strings_are_length_delimited_bytes() {
    let long = "x".repeat(300);
    let binary: &[u8] = &[0x00, 0xFF, 0x07, 0x0A];
    let samples = [Value::from(""), Value::from(long.as_str()), Value::from(binary)];
    assert_eq!(roundtrip(&samples), samples);
}

#[test]
fn nested_tables_roundtrip() {
    let inner = Table::array(["a", "b"]);
    let outer = Table::new();
    outer.set("inner", inner).expect("键");
    outer.set(1.5, false).expect("浮点键");
    outer.set(true, "yes").expect("布尔键");
    let value = Value::from(outer);
    let decoded = roundtrip(std::slice::from_ref(&value));
    assert!(value.deep_eq(&decoded[0]));
}

#[test]
fn shared_table_decodes_to_one_instance() {
    let shared = Table::array([7]);
    let holder = Table::new();
    holder.set("a", shared.clone()).expect("键");
    holder.set("b", shared.clone()).expect("键");

    let decoded = roundtrip(&[Value::from(holder), Value::from(shared)]);
    let holder = table(&decoded[0]);
    let a = table(&holder.get("a").expect("a"));
    let b = table(&holder.get("b").expect("b"));
    assert!(a.ptr_eq(&b));
    assert!(a.ptr_eq(&table(&decoded[1])));
}

#[test]
fn self_cycle_is_restored() {
    let node = Table::new();
    node.set("self", node.clone()).expect("键");
    let decoded = roundtrip(&[Value::from(node.clone())]);
    let back = table(&decoded[0]);
    assert!(table(&back.get("self").expect("self")).ptr_eq(&back));
    back.clear();
    node.clear();
}

#[test]
fn transitive_cycle_is_restored() {
    let a = Table::new();
    let b = Table::new();
    a.set("next", b.clone()).expect("键");
    b.set("next", a.clone()).expect("键");

    let decoded = roundtrip(&[Value::from(a.clone())]);
    let a_back = table(&decoded[0]);
    let b_back = table(&a_back.get("next").expect("next"));
    assert!(!a_back.ptr_eq(&b_back));
    assert!(table(&b_back.get("next").expect("next")).ptr_eq(&a_back));
    a_back.clear();
    a.clear();
}

#[test]
fn tables_can_be_keys() {
    let key = Table::array([1]);
    let map = Table::new();
    map.set(key.clone(), "value").expect("表键");
    map.set("alias", key).expect("键");

    let decoded = roundtrip(&[Value::from(map)]);
    let map = table(&decoded[0]);
    let key = map.get("alias").expect("alias");
    assert_eq!(map.get(key), Some(Value::from("value")));
}

#[test]
fn array_gap_is_preserved_through_map_part() {
    let sparse = Table::new();
    sparse.set(1, 10).expect("键");
    sparse.set(3, 30).expect("键");
    let decoded = roundtrip(&[Value::from(sparse)]);
    let back = table(&decoded[0]);
    assert_eq!(back.len(), 2);
    assert_eq!(back.get(2), None);
    assert_eq!(back.get(3), Some(Value::from(30)));
}

#[test]
fn unpack_bytes_shares_the_input_buffer() {
    let bytes = pack(&[Value::from("payload")]).expect("编码");
    let range = bytes.as_ptr_range();
    let decoded: Vec<Value> = Codec::new().unpack_bytes(bytes.clone()).expect("解码");
    let text: &Bytes = decoded[0].as_bytes().expect("字符串");
    assert_eq!(&text[..], b"payload");
    assert!(range.contains(&text.as_ptr()), "字符串应是输入的切片");
}
