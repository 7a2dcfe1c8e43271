/// 数值：64 位整数或 64 位浮点。
///
/// 相等性按数学值判断，`Integer(3) == Float(3.0)`；NaN 与任何值都不相等。
#[derive(Clone, Copy, Debug)]
pub enum Number {
    /// 整数子类型。
    Integer(i64),
    /// 浮点子类型。
    Float(f64),
}

// 2^63，作为 f64 可精确表示。
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl Number {
    /// 是否为零（整数 0、`0.0` 或 `-0.0`）。
    pub fn is_zero(self) -> bool {
        match self {
            Number::Integer(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }

    /// 若数值是落在 `i64` 范围内的整数，返回该整数。
    pub fn as_integer(self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(i),
            Number::Float(f) => integral_value(f),
        }
    }

    /// 以浮点形式读取。
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// 是否为 NaN。
    pub fn is_nan(self) -> bool {
        matches!(self, Number::Float(f) if f.is_nan())
    }
}

fn integral_value(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&f)).then_some(f as i64)
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Number::Integer(a), Number::Integer(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a == b,
            (Number::Integer(i), Number::Float(f)) | (Number::Float(f), Number::Integer(i)) => {
                integral_value(f) == Some(i)
            }
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Integer(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}
