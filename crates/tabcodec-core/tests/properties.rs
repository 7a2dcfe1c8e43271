//! 编解码性质验证
//!
//! # 教案级注释概览
//!
//! - **核心目标 (Why)**：用随机生成的无环值树覆盖手写向量难以穷举的组合：
//!   1. 任意值序列往返后结构相等；2. 任意合法编码的任意真前缀都被判为截断；
//!   3. 任意字节串都不会让解码器崩溃；4. 流字节序与宿主字节序任意组合都能往返。
//! - **设计手法 (How)**：`value_tree()` 以 `prop_recursive` 生成嵌套表，数组段可含 nil 空洞，
//!   映射段键取整数或短字符串，和数组段的键可能重叠，从而覆盖“原位更新”“赋 nil 删除”等路径。
//!
//! # 合同与边界 (What)
//!
//! - 生成的浮点排除 NaN：NaN 与自身不相等，结构比较无法成立；NaN 的往返另有单元测试覆盖。
//! - 生成的值不含共享与环，这两类结构由 `roundtrip.rs` 中的确定性用例覆盖。

use proptest::collection::vec;
use proptest::prelude::*;
use tabcodec_core::{Bytes, Codec, CodecError, Endian, Table, Value, pack, unpack};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("NaN 不满足自反", |f| !f.is_nan())
            .prop_map(Value::from),
        vec(any::<u8>(), 0..48).prop_map(|raw| Value::from(Bytes::from(raw))),
    ]
}

fn key() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-4i64..12).prop_map(Value::from),
        "[a-z]{1,6}".prop_map(Value::from),
    ]
}

fn value_tree() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(4, 64, 8, |inner| {
        (vec(inner.clone(), 0..6), vec((key(), inner), 0..6)).prop_map(|(items, pairs)| {
            let table = Table::array(items);
            for (k, v) in pairs {
                table.set(k, v).expect("生成的键合法");
            }
            Value::from(table)
        })
    })
}

fn endian() -> impl Strategy<Value = Endian> {
    prop_oneof![Just(Endian::Little), Just(Endian::Big)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_roundtrip_preserves_structure(values in vec(value_tree(), 0..6)) {
        let bytes = pack(&values).expect("编码");
        let decoded = unpack(&bytes).expect("解码");
        prop_assert_eq!(decoded.len(), values.len());
        for (original, back) in values.iter().zip(&decoded) {
            prop_assert!(original.deep_eq(back), "{:?} != {:?}", original, back);
        }
    }

    #[test]
    fn prop_strict_prefixes_are_truncated(values in vec(value_tree(), 0..4)) {
        let bytes = pack(&values).expect("编码");
        for cut in 0..bytes.len() {
            let result = unpack(&bytes[..cut]);
            prop_assert!(
                matches!(result, Err(CodecError::TruncatedInput { .. })),
                "前缀 {} 得到 {:?}",
                cut,
                result
            );
        }
    }

    #[test]
    fn prop_arbitrary_input_never_panics(raw in vec(any::<u8>(), 0..256)) {
        if let Err(error) = unpack(&raw) {
            prop_assert!(error.code().starts_with("codec."));
        }
    }

    #[test]
    fn prop_any_endian_pairing_roundtrips(
        values in vec(value_tree(), 1..4),
        stream in endian(),
        host in endian(),
    ) {
        let bytes = Codec::new().with_stream_endian(stream).pack(&values).expect("编码");
        let decoded: Vec<Value> = Codec::new().with_host_endian(host).unpack(&bytes).expect("解码");
        for (original, back) in values.iter().zip(&decoded) {
            prop_assert!(original.deep_eq(back));
        }
    }
}
