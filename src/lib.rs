//! # BOQ Planner
//!
//! 輸配電工程月度 BOQ 重新預測與庫存沖銷

pub use boq_calc::{
    ConsumptionForecaster, ForecastRecord, ForecastRequest, ForecastResponse, ForecastService,
    InMemoryPlanRepository, InventoryReconciler, PlanRepository, ProcurementLine,
    ProcurementStatus,
};
pub use boq_core::{
    ActualConsumption, BoqError, ConsumptionLedger, ForecastConfig, InputError, InventorySnapshot,
    MaterialId, MonthEntry, MonthlyPlan, Result,
};
