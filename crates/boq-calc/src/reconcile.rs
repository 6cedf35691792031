//! 庫存沖銷：計算實際需要採購的數量

use boq_core::{InputError, InventorySnapshot, MaterialId, MonthlyPlan};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::forecaster::ForecastRecord;

/// 沖銷狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcurementStatus {
    /// 庫存足夠，不需下單
    Sufficient,
    /// 需要下單
    OrderRequired,
    /// 找不到對應庫存品項（以 0 計）
    NoInventoryRecord,
}

/// 單一物料的沖銷結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcurementLine {
    /// 物料
    pub material: MaterialId,

    /// 需求月份
    pub month: u32,

    /// 需求數量
    pub required: Decimal,

    /// 現有庫存（找不到品項時為 None）
    pub available: Option<Decimal>,

    /// 對應到的庫存品項
    pub matched_item: Option<String>,

    /// 需採購數量
    pub to_order: Decimal,

    /// 沖銷狀態
    pub status: ProcurementStatus,
}

impl ProcurementLine {
    /// 是否需要下單
    pub fn needs_order(&self) -> bool {
        self.to_order > Decimal::ZERO
    }

    /// 轉為採購單草稿（不需下單時回傳 None）
    pub fn order_draft(&self, project_id: &str, created_on: NaiveDate) -> Option<ProcurementOrderDraft> {
        if !self.needs_order() {
            return None;
        }

        Some(ProcurementOrderDraft {
            id: Uuid::new_v4(),
            project_id: project_id.to_string(),
            material: self.material.clone(),
            quantity: self.to_order,
            month: self.month,
            created_on,
        })
    }
}

/// 採購單草稿（交由外部採購流程建立正式訂單）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcurementOrderDraft {
    /// 草稿ID
    pub id: Uuid,

    /// 專案ID
    pub project_id: String,

    /// 物料
    pub material: MaterialId,

    /// 採購數量
    pub quantity: Decimal,

    /// 需求月份
    pub month: u32,

    /// 建立日期
    pub created_on: NaiveDate,
}

/// 庫存沖銷計算器
pub struct InventoryReconciler;

impl InventoryReconciler {
    /// 需採購數量 = max(0, 需求 - 現有)
    pub fn quantity_to_order(required: Decimal, available: Decimal) -> Decimal {
        if available >= required {
            Decimal::ZERO
        } else {
            required.saturating_sub(available)
        }
    }

    /// 以庫存快照沖銷單一物料需求
    pub fn reconcile_line(
        material: &MaterialId,
        month: u32,
        required: Decimal,
        inventory: &InventorySnapshot,
    ) -> ProcurementLine {
        match inventory.resolve(material) {
            Some(found) => {
                let to_order = Self::quantity_to_order(required, found.on_hand_qty);
                let status = if to_order > Decimal::ZERO {
                    ProcurementStatus::OrderRequired
                } else {
                    ProcurementStatus::Sufficient
                };

                ProcurementLine {
                    material: material.clone(),
                    month,
                    required,
                    available: Some(found.on_hand_qty),
                    matched_item: Some(found.item),
                    to_order,
                    status,
                }
            }
            None => {
                tracing::debug!("物料 {} 找不到庫存品項，以 0 計", material);
                ProcurementLine {
                    material: material.clone(),
                    month,
                    required,
                    available: None,
                    matched_item: None,
                    to_order: Self::quantity_to_order(required, Decimal::ZERO),
                    status: ProcurementStatus::NoInventoryRecord,
                }
            }
        }
    }

    /// 沖銷某月份的計劃量（每個計劃物料各一筆，庫存足夠者亦保留）
    pub fn reconcile_month(
        plan: &MonthlyPlan,
        month: u32,
        inventory: &InventorySnapshot,
    ) -> boq_core::Result<Vec<ProcurementLine>> {
        if month == 0 || month > plan.total_months() {
            return Err(InputError::MonthOutOfRange {
                month,
                total_months: plan.total_months(),
            }
            .into());
        }

        let lines: Vec<_> = plan
            .entry(month)
            .map(|entry| {
                entry
                    .materials
                    .iter()
                    .map(|(material, &required)| {
                        Self::reconcile_line(material, month, required, inventory)
                    })
                    .collect()
            })
            .unwrap_or_default();

        tracing::info!(
            "專案 {} 第 {} 月沖銷完成：{} 項，需下單 {} 項",
            plan.project_id,
            month,
            lines.len(),
            lines.iter().filter(|l| l.needs_order()).count()
        );

        Ok(lines)
    }

    /// 沖銷重新預測結果（以調整後的下月預測為需求）
    pub fn reconcile_forecast(
        records: &[ForecastRecord],
        next_month: u32,
        inventory: &InventorySnapshot,
    ) -> Vec<ProcurementLine> {
        records
            .iter()
            .map(|record| {
                Self::reconcile_line(&record.material, next_month, record.forecast_next, inventory)
            })
            .collect()
    }
}
