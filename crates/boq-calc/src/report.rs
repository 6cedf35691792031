//! 回應輸出（四捨五入只在這一層進行）

use boq_core::BoqError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::forecaster::ForecastRecord;

/// 重新預測回應
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    pub project_id: String,
    pub current_month: u32,
    pub next_month: u32,
    pub forecast: Vec<ForecastRecordView>,
}

impl ForecastResponse {
    /// 由未四捨五入的預測結果建立回應
    pub fn build(
        project_id: &str,
        current_month: u32,
        records: &[ForecastRecord],
    ) -> boq_core::Result<Self> {
        let forecast = records
            .iter()
            .map(ForecastRecordView::from_record)
            .collect::<boq_core::Result<Vec<_>>>()?;

        Ok(Self {
            project_id: project_id.to_string(),
            current_month,
            next_month: current_month.saturating_add(1),
            forecast,
        })
    }

    pub fn to_json(&self) -> boq_core::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// 單一物料的顯示用預測（數量取整數，PF 取兩位小數）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRecordView {
    pub material: String,
    pub planned_next_before: i64,
    pub forecast_next: i64,
    pub progress_factor: f64,
    pub remaining_boq: i64,
    pub actual_cumulative: i64,
    pub planned_cumulative: i64,
}

impl ForecastRecordView {
    pub fn from_record(record: &ForecastRecord) -> boq_core::Result<Self> {
        Ok(Self {
            material: record.material.to_string(),
            planned_next_before: round_quantity(record.planned_next_before)?,
            forecast_next: round_quantity(record.forecast_next)?,
            progress_factor: round_factor(record.progress_factor)?,
            remaining_boq: round_quantity(record.remaining_boq)?,
            actual_cumulative: round_quantity(record.actual_cumulative)?,
            planned_cumulative: round_quantity(record.planned_cumulative)?,
        })
    }
}

/// 四捨五入到整數（.5 遠離零）
pub fn round_quantity(value: Decimal) -> boq_core::Result<i64> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| BoqError::Calculation(format!("數量 {} 超出可輸出範圍", value)))
}

/// 四捨五入到兩位小數
pub fn round_factor(value: Decimal) -> boq_core::Result<f64> {
    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .ok_or_else(|| BoqError::Calculation(format!("係數 {} 無法輸出", value)))
}
