//! 配置加载：`CodecLimits` 的 TOML 解析、默认值补全与错误报告。

#![cfg(feature = "config-toml")]

use tabcodec_core::{Codec, CodecError, CodecLimits, Table, Value, codes};

#[test]
fn empty_document_yields_defaults() {
    let limits = CodecLimits::from_toml_str("").expect("空文档");
    assert_eq!(limits, CodecLimits::default());
}

#[test]
fn fields_override_independently() {
    let limits = CodecLimits::from_toml_str(
        r#"
        max_depth = 8
        max_refs = 1024
        initial_capacity = 0
        "#,
    )
    .expect("合法配置");
    assert_eq!(limits.max_depth().get(), 8);
    assert_eq!(limits.max_refs().get(), 1024);
    assert_eq!(limits.initial_capacity(), 0);
}

#[test]
fn zero_limits_are_rejected() {
    let error = CodecLimits::from_toml_str("max_depth = 0").expect_err("深度不能为 0");
    assert_eq!(error.code(), codes::INVALID_CONFIG);
}

#[test]
fn unknown_fields_are_rejected() {
    let error = CodecLimits::from_toml_str("max_dept = 8").expect_err("拼写错误");
    assert!(matches!(error, CodecError::InvalidConfig { ref detail } if detail.contains("max_dept")));
}

#[test]
fn loaded_limits_drive_the_codec() {
    let limits = CodecLimits::from_toml_str("max_depth = 1").expect("合法配置");
    let codec = Codec::new().with_limits(limits);
    let outer = Table::array([Value::from(Table::new())]);
    assert_eq!(
        codec.pack(&[Value::from(outer)]),
        Err(CodecError::DepthLimitExceeded { limit: 1 })
    );
}
