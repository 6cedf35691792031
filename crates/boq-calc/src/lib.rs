//! # BOQ Calculation Engine
//!
//! 依實際耗用重新預測月度 BOQ，並以庫存沖銷出需採購數量

pub mod forecaster;
pub mod reconcile;
pub mod report;
pub mod request;
pub mod service;

// Re-export 主要類型
pub use forecaster::{ConsumptionForecaster, ForecastRecord};
pub use reconcile::{InventoryReconciler, ProcurementLine, ProcurementOrderDraft, ProcurementStatus};
pub use report::{ForecastRecordView, ForecastResponse};
pub use request::ForecastRequest;
pub use service::{ForecastService, InMemoryPlanRepository, PlanRepository};
