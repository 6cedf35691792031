//! 實際耗用模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::material::MaterialId;
use crate::{BoqError, InputError};

/// 截至某月份的累計實際耗用（物料 → 累計數量）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActualConsumption {
    cumulative: BTreeMap<MaterialId, Decimal>,
}

impl ActualConsumption {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置某物料的累計耗用
    pub fn with(mut self, material: MaterialId, quantity: Decimal) -> Self {
        self.cumulative.insert(material, quantity);
        self
    }

    /// 設置累計耗用（不可為負）
    pub fn insert(&mut self, material: MaterialId, quantity: Decimal) -> Result<(), InputError> {
        if quantity < Decimal::ZERO {
            return Err(InputError::NegativeQuantity {
                material: material.to_string(),
                quantity: quantity.to_string(),
            });
        }
        self.cumulative.insert(material, quantity);
        Ok(())
    }

    pub fn get(&self, material: &MaterialId) -> Option<Decimal> {
        self.cumulative.get(material).copied()
    }

    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MaterialId, &Decimal)> {
        self.cumulative.iter()
    }
}

impl FromIterator<(MaterialId, Decimal)> for ActualConsumption {
    fn from_iter<T: IntoIterator<Item = (MaterialId, Decimal)>>(iter: T) -> Self {
        Self {
            cumulative: iter.into_iter().collect(),
        }
    }
}

/// 單筆耗用記錄（某月份的增量）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    /// 月份
    pub month: u32,

    /// 物料
    pub material: MaterialId,

    /// 本月耗用增量
    pub quantity: Decimal,

    /// 回報日期
    pub recorded_on: NaiveDate,
}

/// 耗用帳（每月增量，彙總為累計耗用）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsumptionLedger {
    records: Vec<ConsumptionRecord>,
}

impl ConsumptionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 記錄一筆耗用
    pub fn record(
        &mut self,
        month: u32,
        material: MaterialId,
        quantity: Decimal,
        recorded_on: NaiveDate,
    ) -> Result<(), InputError> {
        if month == 0 {
            return Err(InputError::InvalidCurrentMonth(month.to_string()));
        }
        if quantity < Decimal::ZERO {
            return Err(InputError::NegativeQuantity {
                material: material.to_string(),
                quantity: quantity.to_string(),
            });
        }

        self.records.push(ConsumptionRecord {
            month,
            material,
            quantity,
            recorded_on,
        });
        Ok(())
    }

    pub fn records(&self) -> &[ConsumptionRecord] {
        &self.records
    }

    /// 月份 1..=month 的累計耗用
    pub fn cumulative_through(&self, month: u32) -> crate::Result<ActualConsumption> {
        let mut totals: BTreeMap<MaterialId, Decimal> = BTreeMap::new();
        for record in self.records.iter().filter(|r| r.month <= month) {
            let total = totals.entry(record.material.clone()).or_insert(Decimal::ZERO);
            *total = total.checked_add(record.quantity).ok_or_else(|| {
                BoqError::Calculation(format!("物料 {} 的累計耗用溢出", record.material))
            })?;
        }
        Ok(ActualConsumption { cumulative: totals })
    }
}
