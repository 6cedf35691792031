//! 耗用重新預測
//!
//! 依實際累計耗用與計劃累計量的比值（進度係數 PF）調整下個月的計劃量，
//! 並以剩餘 BOQ 為上限。

use boq_core::{
    ActualConsumption, BoqError, ForecastConfig, InputError, MaterialId, MonthlyPlan,
};
use rust_decimal::Decimal;
use serde::Serialize;

/// 單一物料的重新預測結果（未四捨五入）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRecord {
    /// 物料
    pub material: MaterialId,

    /// 原計劃的下月數量
    pub planned_next_before: Decimal,

    /// 調整後的下月預測
    pub forecast_next: Decimal,

    /// 夾限後的進度係數
    pub progress_factor: Decimal,

    /// 剩餘 BOQ（總計劃 - 實際累計，不小於 0）
    pub remaining_boq: Decimal,

    /// 實際累計耗用
    pub actual_cumulative: Decimal,

    /// 計劃累計量
    pub planned_cumulative: Decimal,
}

/// 耗用重新預測器
#[derive(Debug, Clone)]
pub struct ConsumptionForecaster {
    config: ForecastConfig,
}

impl ConsumptionForecaster {
    /// 創建重新預測器（配置需通過驗證）
    pub fn new(config: ForecastConfig) -> boq_core::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// 預測 `current_month + 1` 的各物料需求
    ///
    /// 輸入在逐物料計算前全部驗證完畢，失敗時不會回傳部分結果。
    pub fn forecast(
        &self,
        plan: &MonthlyPlan,
        current_month: u32,
        actual: &ActualConsumption,
    ) -> boq_core::Result<Vec<ForecastRecord>> {
        if current_month == 0 {
            return Err(InputError::InvalidCurrentMonth(current_month.to_string()).into());
        }
        if plan.is_empty() {
            return Err(InputError::EmptyPlan.into());
        }
        let negative = actual
            .iter()
            .find(|(_, quantity)| quantity.is_sign_negative() && !quantity.is_zero());
        if let Some((material, quantity)) = negative {
            return Err(InputError::NegativeQuantity {
                material: material.to_string(),
                quantity: quantity.to_string(),
            }
            .into());
        }

        let materials = plan.materials(self.config.material_universe);
        for material in &materials {
            self.config
                .catalog
                .admit(material, self.config.unknown_material_policy)?;
        }

        tracing::info!(
            "開始重新預測：專案 {}，當前月份 {}，物料 {} 項，實際耗用 {} 筆",
            plan.project_id,
            current_month,
            materials.len(),
            actual.len()
        );

        for (material, _) in actual.iter() {
            if !materials.contains(material) {
                tracing::debug!("實際耗用中的物料 {} 不在計劃物料集合內，忽略", material);
            }
        }

        let records = materials
            .iter()
            .map(|material| self.forecast_material(plan, material, current_month, actual))
            .collect::<boq_core::Result<Vec<_>>>()?;

        tracing::info!("重新預測完成，輸出 {} 筆", records.len());
        Ok(records)
    }

    /// 單物料重新預測
    fn forecast_material(
        &self,
        plan: &MonthlyPlan,
        material: &MaterialId,
        current_month: u32,
        actual: &ActualConsumption,
    ) -> boq_core::Result<ForecastRecord> {
        let planned_cumulative = plan.planned_cumulative(material, current_month)?;

        // 未回報者視為依計劃進行
        let actual_cumulative = actual.get(material).unwrap_or(planned_cumulative);

        let planned_next = plan.planned_next(material, current_month);
        let total_planned = plan.total_planned(material)?;

        let raw_factor = if planned_cumulative > Decimal::ZERO {
            actual_cumulative
                .checked_div(planned_cumulative)
                .ok_or_else(|| overflow(material, "進度係數"))?
        } else {
            Decimal::ONE
        };
        let progress_factor = self.config.clamp_progress_factor(raw_factor);

        let remaining_boq = total_planned
            .checked_sub(actual_cumulative)
            .ok_or_else(|| overflow(material, "剩餘 BOQ"))?
            .max(Decimal::ZERO);

        let forecast_next = planned_next
            .checked_mul(progress_factor)
            .ok_or_else(|| overflow(material, "下月預測"))?
            .min(remaining_boq);

        tracing::debug!(
            "物料 {}: 計劃累計 {}, 實際累計 {}, PF {} (原始 {}), 下月計劃 {}, 剩餘 {}, 預測 {}",
            material,
            planned_cumulative,
            actual_cumulative,
            progress_factor,
            raw_factor,
            planned_next,
            remaining_boq,
            forecast_next
        );

        Ok(ForecastRecord {
            material: material.clone(),
            planned_next_before: planned_next,
            forecast_next,
            progress_factor,
            remaining_boq,
            actual_cumulative,
            planned_cumulative,
        })
    }
}

fn overflow(material: &MaterialId, what: &str) -> BoqError {
    BoqError::Calculation(format!("物料 {} 的{}計算溢出", material, what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use boq_core::{MaterialCatalog, MaterialUniverse, MonthEntry, UnknownMaterialPolicy};
    use rstest::rstest;

    fn id(name: &str) -> MaterialId {
        MaterialId::parse(name).unwrap()
    }

    fn cement_plan() -> MonthlyPlan {
        let breakdown = [500, 300, 200, 100]
            .iter()
            .enumerate()
            .map(|(i, &qty)| {
                MonthEntry::new(i as u32 + 1).with_material(id("Cement_MT"), Decimal::from(qty))
            })
            .collect();
        MonthlyPlan::new("PRJ-001".to_string(), 4, breakdown).unwrap()
    }

    fn forecaster() -> ConsumptionForecaster {
        ConsumptionForecaster::new(ForecastConfig::default()).unwrap()
    }

    fn single(actual: ActualConsumption, current_month: u32) -> ForecastRecord {
        let records = forecaster()
            .forecast(&cement_plan(), current_month, &actual)
            .unwrap();
        assert_eq!(records.len(), 1);
        records.into_iter().next().unwrap()
    }

    #[test]
    fn test_under_consumption() {
        let record = single(
            ActualConsumption::new().with(id("Cement_MT"), Decimal::from(640)),
            2,
        );

        assert_eq!(record.planned_cumulative, Decimal::from(800));
        assert_eq!(record.progress_factor, Decimal::new(8, 1));
        assert_eq!(record.planned_next_before, Decimal::from(200));
        assert_eq!(record.remaining_boq, Decimal::from(460));
        assert_eq!(record.forecast_next, Decimal::from(160));
    }

    #[test]
    fn test_over_consumption_collapses_to_remaining() {
        let record = single(
            ActualConsumption::new().with(id("Cement_MT"), Decimal::from(2000)),
            2,
        );

        assert_eq!(record.progress_factor, Decimal::new(15, 1));
        assert_eq!(record.remaining_boq, Decimal::ZERO);
        assert_eq!(record.forecast_next, Decimal::ZERO);
    }

    #[test]
    fn test_missing_actual_assumes_on_schedule() {
        let record = single(ActualConsumption::new(), 2);

        assert_eq!(record.actual_cumulative, Decimal::from(800));
        assert_eq!(record.progress_factor, Decimal::ONE);
        assert_eq!(record.forecast_next, Decimal::from(200));
    }

    #[test]
    fn test_last_month_has_no_next() {
        let record = single(
            ActualConsumption::new().with(id("Cement_MT"), Decimal::from(700)),
            4,
        );
        assert_eq!(record.planned_next_before, Decimal::ZERO);
        assert_eq!(record.forecast_next, Decimal::ZERO);
    }

    #[rstest]
    #[case(100, Decimal::new(5, 1))]
    #[case(0, Decimal::new(5, 1))]
    #[case(880, Decimal::new(11, 1))]
    #[case(1300, Decimal::new(15, 1))]
    fn test_progress_factor_clamp(#[case] actual: i64, #[case] expected: Decimal) {
        let record = single(
            ActualConsumption::new().with(id("Cement_MT"), Decimal::from(actual)),
            2,
        );
        assert_eq!(record.progress_factor, expected);
    }

    #[test]
    fn test_zero_planned_cumulative_is_neutral() {
        let plan = MonthlyPlan::new(
            "PRJ-002".to_string(),
            3,
            vec![
                MonthEntry::new(1).with_material(id("Power_Transformer_Nos"), Decimal::ZERO),
                MonthEntry::new(2).with_material(id("Power_Transformer_Nos"), Decimal::from(2)),
            ],
        )
        .unwrap();
        let actual = ActualConsumption::new().with(id("Power_Transformer_Nos"), Decimal::from(5));

        let records = forecaster().forecast(&plan, 1, &actual).unwrap();
        assert_eq!(records[0].progress_factor, Decimal::ONE);
        // 剩餘 = max(0, 2 - 5) = 0
        assert_eq!(records[0].remaining_boq, Decimal::ZERO);
        assert_eq!(records[0].forecast_next, Decimal::ZERO);
    }

    #[test]
    fn test_current_month_without_entry() {
        let plan = MonthlyPlan::new(
            "PRJ-003".to_string(),
            5,
            vec![
                MonthEntry::new(1).with_material(id("Sand_CUM"), Decimal::from(10)),
                MonthEntry::new(4).with_material(id("Sand_CUM"), Decimal::from(30)),
            ],
        )
        .unwrap();

        let records = forecaster()
            .forecast(&plan, 3, &ActualConsumption::new().with(id("Sand_CUM"), Decimal::from(12)))
            .unwrap();

        assert_eq!(records[0].planned_cumulative, Decimal::from(10));
        assert_eq!(records[0].progress_factor, Decimal::new(12, 1));
        assert_eq!(records[0].forecast_next, Decimal::from(28));
    }

    #[test]
    fn test_invalid_inputs_fail_before_computation() {
        let empty = MonthlyPlan::new("PRJ-004".to_string(), 3, vec![]).unwrap();
        let err = forecaster()
            .forecast(&empty, 1, &ActualConsumption::new())
            .unwrap_err();
        assert!(matches!(err, BoqError::Input(InputError::EmptyPlan)));

        let err = forecaster()
            .forecast(&cement_plan(), 0, &ActualConsumption::new())
            .unwrap_err();
        assert!(matches!(err, BoqError::Input(InputError::InvalidCurrentMonth(_))));
    }

    #[test]
    fn test_negative_actual_rejected() {
        let plan = MonthlyPlan::new(
            "PRJ-007".to_string(),
            2,
            vec![
                MonthEntry::new(1).with_material(id("Cement_MT"), Decimal::from(100)),
                MonthEntry::new(2).with_material(id("Cement_MT"), Decimal::from(100)),
            ],
        )
        .unwrap();
        let actual = ActualConsumption::new().with(id("Cement_MT"), Decimal::from(-50));

        let err = forecaster().forecast(&plan, 1, &actual).unwrap_err();
        assert!(matches!(
            err,
            BoqError::Input(InputError::NegativeQuantity { .. })
        ));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_plan_sum_overflow_is_calculation_error() {
        let plan = MonthlyPlan::new(
            "PRJ-008".to_string(),
            2,
            vec![
                MonthEntry::new(1).with_material(id("Cement_MT"), Decimal::MAX),
                MonthEntry::new(2).with_material(id("Cement_MT"), Decimal::MAX),
            ],
        )
        .unwrap();

        let err = forecaster()
            .forecast(&plan, 1, &ActualConsumption::new())
            .unwrap_err();
        assert!(matches!(err, BoqError::Calculation(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_union_includes_late_materials() {
        let plan = MonthlyPlan::new(
            "PRJ-005".to_string(),
            3,
            vec![
                MonthEntry::new(1).with_material(id("Cement_MT"), Decimal::from(10)),
                MonthEntry::new(2).with_material(id("Tower_Steel_MT"), Decimal::from(40)),
                MonthEntry::new(3).with_material(id("Tower_Steel_MT"), Decimal::from(60)),
            ],
        )
        .unwrap();

        let union = forecaster()
            .forecast(&plan, 2, &ActualConsumption::new())
            .unwrap();
        let names: Vec<_> = union.iter().map(|r| r.material.as_str()).collect();
        assert_eq!(names, vec!["Cement_MT", "Tower_Steel_MT"]);
        assert_eq!(union[1].forecast_next, Decimal::from(60));

        let first_month_only = ConsumptionForecaster::new(
            ForecastConfig::default().with_material_universe(MaterialUniverse::FirstMonth),
        )
        .unwrap()
        .forecast(&plan, 2, &ActualConsumption::new())
        .unwrap();
        assert_eq!(first_month_only.len(), 1);
    }

    #[test]
    fn test_unknown_material_policy() {
        let plan = MonthlyPlan::new(
            "PRJ-006".to_string(),
            2,
            vec![MonthEntry::new(1).with_material(id("Mystery_Item"), Decimal::from(3))],
        )
        .unwrap();

        assert!(forecaster()
            .forecast(&plan, 1, &ActualConsumption::new())
            .is_ok());

        let strict = ConsumptionForecaster::new(
            ForecastConfig::default()
                .with_catalog(MaterialCatalog::builtin())
                .with_unknown_material_policy(UnknownMaterialPolicy::Reject),
        )
        .unwrap();
        let err = strict
            .forecast(&plan, 1, &ActualConsumption::new())
            .unwrap_err();
        assert!(matches!(err, BoqError::Input(InputError::UnknownMaterial(_))));
    }

    #[test]
    fn test_custom_bounds() {
        let narrow = ConsumptionForecaster::new(
            ForecastConfig::default().with_progress_bounds(Decimal::new(9, 1), Decimal::new(11, 1)),
        )
        .unwrap();
        let records = narrow
            .forecast(
                &cement_plan(),
                2,
                &ActualConsumption::new().with(id("Cement_MT"), Decimal::from(640)),
            )
            .unwrap();
        assert_eq!(records[0].progress_factor, Decimal::new(9, 1));
        assert_eq!(records[0].forecast_next, Decimal::from(180));

        assert!(ConsumptionForecaster::new(
            ForecastConfig::default().with_progress_bounds(Decimal::new(11, 1), Decimal::new(9, 1))
        )
        .is_err());
    }
}
