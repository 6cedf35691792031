//! 月度 BOQ 計劃模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::MaterialUniverse;
use crate::material::MaterialId;
use crate::{BoqError, InputError};

/// 單月計劃量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthEntry {
    /// 月份（從 1 開始）
    pub month: u32,

    /// 物料 → 計劃數量
    pub materials: BTreeMap<MaterialId, Decimal>,
}

impl MonthEntry {
    /// 創建空的月份
    pub fn new(month: u32) -> Self {
        Self {
            month,
            materials: BTreeMap::new(),
        }
    }

    /// 建構器模式：加入物料數量
    pub fn with_material(mut self, material: MaterialId, quantity: Decimal) -> Self {
        self.materials.insert(material, quantity);
        self
    }

    /// 該月某物料的計劃量（未列出視為 0）
    pub fn quantity(&self, material: &MaterialId) -> Decimal {
        self.materials.get(material).copied().unwrap_or(Decimal::ZERO)
    }
}

/// 月度 BOQ 計劃（由外部 ML 預測流程產生）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MonthlyPlanDocument")]
pub struct MonthlyPlan {
    /// 專案ID
    pub project_id: String,

    /// 計劃總月數
    total_months: u32,

    /// 依月份排序的明細（可不連續）
    breakdown: Vec<MonthEntry>,

    /// 產生日期
    pub generated_on: Option<NaiveDate>,
}

impl MonthlyPlan {
    /// 創建並驗證月度計劃
    ///
    /// 月份必須落在 `1..=total_months` 且不可重複，數量不可為負。
    pub fn new(
        project_id: String,
        total_months: u32,
        breakdown: Vec<MonthEntry>,
    ) -> Result<Self, InputError> {
        if total_months == 0 {
            return Err(InputError::InvalidTotalMonths);
        }

        let mut breakdown = breakdown;
        breakdown.sort_by_key(|entry| entry.month);

        let mut seen = BTreeSet::new();
        for entry in &breakdown {
            Self::check_month(entry.month, total_months)?;
            if !seen.insert(entry.month) {
                return Err(InputError::DuplicateMonth(entry.month));
            }
            for (material, quantity) in &entry.materials {
                Self::check_quantity(material, *quantity)?;
            }
        }

        Ok(Self {
            project_id,
            total_months,
            breakdown,
            generated_on: None,
        })
    }

    /// 建構器模式：設置產生日期
    pub fn with_generated_on(mut self, date: NaiveDate) -> Self {
        self.generated_on = Some(date);
        self
    }

    pub fn total_months(&self) -> u32 {
        self.total_months
    }

    pub fn breakdown(&self) -> &[MonthEntry] {
        &self.breakdown
    }

    pub fn is_empty(&self) -> bool {
        self.breakdown.is_empty()
    }

    /// 明細中最後一個月份
    pub fn last_month(&self) -> Option<u32> {
        self.breakdown.last().map(|entry| entry.month)
    }

    /// 取得某月份明細
    pub fn entry(&self, month: u32) -> Option<&MonthEntry> {
        self.breakdown
            .binary_search_by_key(&month, |entry| entry.month)
            .ok()
            .map(|idx| &self.breakdown[idx])
    }

    /// 推導物料集合（依物料代碼排序）
    pub fn materials(&self, universe: MaterialUniverse) -> BTreeSet<MaterialId> {
        match universe {
            MaterialUniverse::FirstMonth => self
                .breakdown
                .first()
                .map(|entry| entry.materials.keys().cloned().collect())
                .unwrap_or_default(),
            MaterialUniverse::Union => self
                .breakdown
                .iter()
                .flat_map(|entry| entry.materials.keys().cloned())
                .collect(),
        }
    }

    /// 某月份的計劃量（月份不存在視為 0）
    pub fn planned_in_month(&self, material: &MaterialId, month: u32) -> Decimal {
        self.entry(month)
            .map(|entry| entry.quantity(material))
            .unwrap_or(Decimal::ZERO)
    }

    /// 月份 1..=through_month 的累計計劃量
    pub fn planned_cumulative(
        &self,
        material: &MaterialId,
        through_month: u32,
    ) -> crate::Result<Decimal> {
        let quantities = self
            .breakdown
            .iter()
            .take_while(|entry| entry.month <= through_month)
            .map(|entry| entry.quantity(material));
        checked_sum(material, quantities)
    }

    /// 下個月（current_month + 1）的計劃量，超出計劃期間為 0
    pub fn planned_next(&self, material: &MaterialId, current_month: u32) -> Decimal {
        match current_month.checked_add(1) {
            Some(next) => self.planned_in_month(material, next),
            None => Decimal::ZERO,
        }
    }

    /// 整個計劃期間的總計劃量
    pub fn total_planned(&self, material: &MaterialId) -> crate::Result<Decimal> {
        checked_sum(
            material,
            self.breakdown.iter().map(|entry| entry.quantity(material)),
        )
    }

    /// 修改（或新增）某月某物料的計劃量
    pub fn set_quantity(
        &mut self,
        month: u32,
        material: MaterialId,
        quantity: Decimal,
    ) -> Result<(), InputError> {
        Self::check_month(month, self.total_months)?;
        Self::check_quantity(&material, quantity)?;

        let idx = match self
            .breakdown
            .binary_search_by_key(&month, |entry| entry.month)
        {
            Ok(idx) => idx,
            Err(idx) => {
                self.breakdown.insert(idx, MonthEntry::new(month));
                idx
            }
        };

        tracing::debug!(
            "專案 {} 第 {} 月 {} 計劃量設為 {}",
            self.project_id,
            month,
            material,
            quantity
        );
        self.breakdown[idx].materials.insert(material, quantity);
        Ok(())
    }

    /// 刪除某月某物料，回傳原計劃量
    pub fn remove_material(&mut self, month: u32, material: &MaterialId) -> crate::Result<Decimal> {
        let removed = self
            .breakdown
            .iter_mut()
            .find(|entry| entry.month == month)
            .and_then(|entry| entry.materials.remove(material));

        removed.ok_or_else(|| {
            BoqError::NotFound(format!(
                "專案 {} 第 {} 月沒有物料 {}",
                self.project_id, month, material
            ))
        })
    }

    /// 從所有月份刪除某物料，回傳刪除的筆數
    pub fn remove_material_everywhere(&mut self, material: &MaterialId) -> usize {
        self.breakdown
            .iter_mut()
            .filter_map(|entry| entry.materials.remove(material))
            .count()
    }

    fn check_month(month: u32, total_months: u32) -> Result<(), InputError> {
        if month == 0 || month > total_months {
            return Err(InputError::MonthOutOfRange {
                month,
                total_months,
            });
        }
        Ok(())
    }

    fn check_quantity(material: &MaterialId, quantity: Decimal) -> Result<(), InputError> {
        if quantity.is_sign_negative() && !quantity.is_zero() {
            return Err(InputError::NegativeQuantity {
                material: material.to_string(),
                quantity: quantity.to_string(),
            });
        }
        Ok(())
    }
}

/// 逐月加總，溢出時回傳計算錯誤
fn checked_sum(
    material: &MaterialId,
    mut quantities: impl Iterator<Item = Decimal>,
) -> crate::Result<Decimal> {
    quantities.try_fold(Decimal::ZERO, |total, quantity| {
        total.checked_add(quantity).ok_or_else(|| {
            BoqError::Calculation(format!("物料 {} 的計劃量加總溢出", material))
        })
    })
}

/// 儲存層的月度計劃文件（反序列化後需經驗證）
#[derive(Debug, Clone, Deserialize)]
struct MonthlyPlanDocument {
    project_id: String,
    total_months: u32,
    #[serde(default)]
    breakdown: Vec<MonthEntry>,
    #[serde(default)]
    generated_on: Option<NaiveDate>,
}

impl TryFrom<MonthlyPlanDocument> for MonthlyPlan {
    type Error = InputError;

    fn try_from(doc: MonthlyPlanDocument) -> Result<Self, Self::Error> {
        let mut plan = MonthlyPlan::new(doc.project_id, doc.total_months, doc.breakdown)?;
        plan.generated_on = doc.generated_on;
        Ok(plan)
    }
}
