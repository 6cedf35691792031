//! 重新預測請求解析

use boq_core::{ActualConsumption, InputError, MaterialId};
use rust_decimal::Decimal;
use serde_json::Value;

const CURRENT_MONTH: &str = "currentMonth";
const ACTUAL_CUMULATIVE: &str = "actualCumulative";

/// 重新預測請求
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    /// 當前月份（從 1 開始）
    pub current_month: u32,

    /// 截至當前月份的累計實際耗用
    pub actual: ActualConsumption,
}

impl ForecastRequest {
    pub fn new(current_month: u32, actual: ActualConsumption) -> Self {
        Self {
            current_month,
            actual,
        }
    }

    /// 從請求 JSON 解析
    ///
    /// 格式：`{ "currentMonth": 2, "actualCumulative": { "Cement_MT": 640 } }`
    pub fn from_json(body: &Value) -> Result<Self, InputError> {
        let current_month = match body.get(CURRENT_MONTH) {
            None | Some(Value::Null) => return Err(InputError::MissingField(CURRENT_MONTH)),
            Some(value) => parse_current_month(value)?,
        };

        let entries = match body.get(ACTUAL_CUMULATIVE) {
            None | Some(Value::Null) => return Err(InputError::MissingField(ACTUAL_CUMULATIVE)),
            Some(Value::Object(entries)) => entries,
            Some(_) => {
                return Err(InputError::MalformedField {
                    field: ACTUAL_CUMULATIVE.to_string(),
                    reason: "必須為物件".to_string(),
                })
            }
        };

        let mut actual = ActualConsumption::new();
        for (name, value) in entries {
            let material = MaterialId::parse(name)?;
            let quantity = match value {
                Value::Number(number) => number_to_decimal(number),
                _ => None,
            }
            .ok_or_else(|| InputError::MalformedField {
                field: format!("{}.{}", ACTUAL_CUMULATIVE, name),
                reason: "必須為數字".to_string(),
            })?;
            actual.insert(material, quantity)?;
        }

        Ok(Self::new(current_month, actual))
    }

    /// 下個月份
    pub fn next_month(&self) -> u32 {
        self.current_month.saturating_add(1)
    }
}

/// 接受正整數，包含無小數部分的浮點數（例如 `2.0`）
fn parse_current_month(value: &Value) -> Result<u32, InputError> {
    let month = match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|month| month.is_finite() && month.fract() == 0.0 && *month >= 0.0)
                .map(|month| month as u64)
        }),
        _ => None,
    };

    month
        .filter(|&month| month > 0)
        .and_then(|month| u32::try_from(month).ok())
        .ok_or_else(|| InputError::InvalidCurrentMonth(value.to_string()))
}

fn number_to_decimal(number: &serde_json::Number) -> Option<Decimal> {
    if let Some(value) = number.as_i64() {
        return Some(Decimal::from(value));
    }
    if let Some(value) = number.as_u64() {
        return Some(Decimal::from(value));
    }
    number
        .as_f64()
        .filter(|value| value.is_finite())
        .and_then(|value| Decimal::try_from(value).ok())
}
