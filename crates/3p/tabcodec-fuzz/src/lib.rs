//! tabcodec-fuzz 公共支持库。
//!
//! # 教案式定位
//! - **Why**：fuzz target 与常规回归测试共用同一套“构造值 → 编码 → 解码 → 比较”逻辑，
//!   CI 不依赖 libFuzzer 运行时也能重放样本；
//! - **What**：[`RoundtripCase`] 描述可由 `arbitrary` 生成的值森林（含共享与环），
//!   [`check_roundtrip`] 与 [`check_unpack`] 是两个 target 的执行入口；
//! - **How**：`Share` 节点引用此前构造过的任意一张表，若该表仍在构造中即形成环；
//!   检查结束后 [`release_tables`] 清空所有可达表，避免环形引用在泄漏检测下报错。

use std::collections::HashSet;

use arbitrary::Arbitrary;
use tabcodec_core::{Codec, CodecError, Endian, MAX_VALUES, Table, Value};

/// 构造值树时的最大嵌套层数，超出部分以 nil 代替。
pub const MAX_SPEC_DEPTH: usize = 48;

/// 值规格。
#[derive(Debug, Arbitrary)]
pub enum ValueSpec {
    /// nil。
    Nil,
    /// 布尔。
    Boolean(bool),
    /// 整数。
    Integer(i64),
    /// 浮点；NaN 不自反，构造时以 nil 代替。
    Float(f64),
    /// 字节串。
    String(Vec<u8>),
    /// 新表：数组段元素与映射段键值对。
    Table {
        /// 依次追加到数组段的元素。
        items: Vec<ValueSpec>,
        /// 映射段键值对。
        pairs: Vec<(KeySpec, ValueSpec)>,
    },
    /// 引用此前构造的第 `n % 已构造表数` 张表。
    Share(u8),
}

/// 键规格，不包含 nil 与 NaN。
#[derive(Debug, Arbitrary)]
pub enum KeySpec {
    /// 小整数键，容易与数组段重叠。
    Integer(i8),
    /// 字符串键。
    Text(String),
    /// 布尔键。
    Boolean(bool),
}

/// 往返用例。
#[derive(Debug, Arbitrary)]
pub struct RoundtripCase {
    /// 顶层值，超过 255 个时截断。
    pub values: Vec<ValueSpec>,
    /// 以大端写流。
    pub big_endian_stream: bool,
    /// 以大端作为宿主字节序读取。
    pub big_endian_host: bool,
}

#[derive(Default)]
struct Builder {
    tables: Vec<Table>,
}

impl Builder {
    fn build(&mut self, spec: &ValueSpec, depth: usize) -> Value {
        match spec {
            ValueSpec::Nil => Value::Nil,
            ValueSpec::Boolean(b) => Value::from(*b),
            ValueSpec::Integer(i) => Value::from(*i),
            ValueSpec::Float(f) if f.is_nan() => Value::Nil,
            ValueSpec::Float(f) => Value::from(*f),
            ValueSpec::String(raw) => Value::from(raw.as_slice()),
            ValueSpec::Table { items, pairs } if depth < MAX_SPEC_DEPTH => {
                let table = Table::new();
                self.tables.push(table.clone());
                for item in items {
                    let value = self.build(item, depth + 1);
                    table.push(value);
                }
                for (key, value) in pairs {
                    let value = self.build(value, depth + 1);
                    // KeySpec 不会产出 nil 或 NaN。
                    let _ = table.set(key.to_value(), value);
                }
                Value::from(table)
            }
            ValueSpec::Table { .. } => Value::Nil,
            ValueSpec::Share(n) => match self.tables.len() {
                0 => Value::Nil,
                len => Value::from(self.tables[usize::from(*n) % len].clone()),
            },
        }
    }
}

impl KeySpec {
    fn to_value(&self) -> Value {
        match self {
            KeySpec::Integer(i) => Value::from(i64::from(*i)),
            KeySpec::Text(text) => Value::from(text.as_str()),
            KeySpec::Boolean(b) => Value::from(*b),
        }
    }
}

/// 按规格构造顶层值，最多 255 个。
pub fn build_values(specs: &[ValueSpec]) -> Vec<Value> {
    let mut builder = Builder::default();
    specs
        .iter()
        .take(MAX_VALUES)
        .map(|spec| builder.build(spec, 0))
        .collect()
}

/// 清空从 `values` 可达的所有表，断开环形引用。
pub fn release_tables(values: &[Value]) {
    let mut seen = HashSet::new();
    let mut pending: Vec<Table> = values.iter().filter_map(|v| v.as_table().cloned()).collect();
    let mut reachable = Vec::new();
    while let Some(table) = pending.pop() {
        if !seen.insert(table.id()) {
            continue;
        }
        for (key, value) in table.entries() {
            pending.extend(key.as_table().cloned());
            pending.extend(value.as_table().cloned());
        }
        reachable.push(table);
    }
    for table in reachable {
        table.clear();
    }
}

fn endian(big: bool) -> Endian {
    if big { Endian::Big } else { Endian::Little }
}

/// 构造值、编码、以指定宿主字节序解码，并断言结构相等。
pub fn check_roundtrip(case: &RoundtripCase) {
    let values = build_values(&case.values);
    let bytes = match Codec::new()
        .with_stream_endian(endian(case.big_endian_stream))
        .pack(&values)
    {
        Ok(bytes) => bytes,
        // 被覆盖的表可能经由 Share 出现在更深的位置。
        Err(CodecError::DepthLimitExceeded { .. }) => {
            release_tables(&values);
            return;
        }
        Err(error) => panic!("合法值编码失败：{error}"),
    };
    let decoded: Vec<Value> = Codec::new()
        .with_host_endian(endian(case.big_endian_host))
        .unpack(&bytes)
        .unwrap_or_else(|error| panic!("自身编码的输出无法解码：{error}"));

    assert_eq!(decoded.len(), values.len());
    for (original, back) in values.iter().zip(&decoded) {
        assert!(original.deep_eq(back), "{original:?} 往返后变为 {back:?}");
    }
    release_tables(&values);
    release_tables(&decoded);
}

/// 解码任意字节；成功时再编码一次，只允许资源上限类错误。
pub fn check_unpack(data: &[u8]) {
    let codec = Codec::new();
    let Ok(values) = codec.unpack::<Value>(data) else {
        return;
    };
    match codec.pack(&values) {
        Ok(_) => {}
        Err(CodecError::DepthLimitExceeded { .. } | CodecError::RefTableOverflow { .. }) => {}
        Err(error) => panic!("解码结果无法重新编码：{error}"),
    }
    release_tables(&values);
}
