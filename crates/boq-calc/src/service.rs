//! 重新預測服務：串接計劃存取、預測、輸出與庫存沖銷

use boq_core::{BoqError, ForecastConfig, InventorySnapshot, MonthlyPlan};
use rayon::prelude::*;
use std::collections::HashMap;

use crate::forecaster::ConsumptionForecaster;
use crate::reconcile::{InventoryReconciler, ProcurementLine};
use crate::report::ForecastResponse;
use crate::request::ForecastRequest;

/// 月度計劃存取介面（由外部儲存層實作）
pub trait PlanRepository {
    /// 取得專案的月度計劃，不存在時回傳 None
    fn monthly_plan(&self, project_id: &str) -> Option<MonthlyPlan>;
}

/// 記憶體內的月度計劃存放
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanRepository {
    plans: HashMap<String, MonthlyPlan>,
}

impl InMemoryPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 儲存（或覆蓋）專案的月度計劃
    pub fn insert(&mut self, plan: MonthlyPlan) {
        self.plans.insert(plan.project_id.clone(), plan);
    }

    /// 刪除專案的月度計劃
    pub fn remove(&mut self, project_id: &str) -> Option<MonthlyPlan> {
        self.plans.remove(project_id)
    }

    /// 取得可編輯的月度計劃
    pub fn plan_mut(&mut self, project_id: &str) -> Option<&mut MonthlyPlan> {
        self.plans.get_mut(project_id)
    }
}

impl PlanRepository for InMemoryPlanRepository {
    fn monthly_plan(&self, project_id: &str) -> Option<MonthlyPlan> {
        self.plans.get(project_id).cloned()
    }
}

/// 重新預測服務
pub struct ForecastService<R: PlanRepository> {
    repository: R,
    forecaster: ConsumptionForecaster,
}

impl<R: PlanRepository> ForecastService<R> {
    /// 創建服務（配置需通過驗證）
    pub fn new(repository: R, config: ForecastConfig) -> boq_core::Result<Self> {
        Ok(Self {
            repository,
            forecaster: ConsumptionForecaster::new(config)?,
        })
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repository
    }

    /// 對專案執行重新預測並輸出回應
    pub fn forecast(
        &self,
        project_id: &str,
        request: &ForecastRequest,
    ) -> boq_core::Result<ForecastResponse> {
        let plan = self.load_plan(project_id)?;
        let records = self
            .forecaster
            .forecast(&plan, request.current_month, &request.actual)?;
        ForecastResponse::build(project_id, request.current_month, &records)
    }

    /// 先驗證請求 JSON，再載入計劃預測
    pub fn forecast_json(
        &self,
        project_id: &str,
        body: &serde_json::Value,
    ) -> boq_core::Result<ForecastResponse> {
        let request = ForecastRequest::from_json(body)?;
        self.forecast(project_id, &request)
    }

    /// 以重新預測結果對庫存沖銷，得出下月需採購量
    pub fn procurement_for_next_month(
        &self,
        project_id: &str,
        request: &ForecastRequest,
        inventory: &InventorySnapshot,
    ) -> boq_core::Result<Vec<ProcurementLine>> {
        let plan = self.load_plan(project_id)?;
        let records = self
            .forecaster
            .forecast(&plan, request.current_month, &request.actual)?;
        Ok(InventoryReconciler::reconcile_forecast(
            &records,
            request.next_month(),
            inventory,
        ))
    }

    /// 對專案某月份的原計劃量進行庫存沖銷
    pub fn procurement_for_month(
        &self,
        project_id: &str,
        month: u32,
        inventory: &InventorySnapshot,
    ) -> boq_core::Result<Vec<ProcurementLine>> {
        let plan = self.load_plan(project_id)?;
        InventoryReconciler::reconcile_month(&plan, month, inventory)
    }

    fn load_plan(&self, project_id: &str) -> boq_core::Result<MonthlyPlan> {
        self.repository.monthly_plan(project_id).ok_or_else(|| {
            tracing::warn!("專案 {} 尚未產生月度計劃", project_id);
            BoqError::PlanNotFound(project_id.to_string())
        })
    }
}

impl<R: PlanRepository + Sync> ForecastService<R> {
    /// 平行處理多個專案（各專案互不相依，結果順序與輸入一致）
    pub fn forecast_batch(
        &self,
        jobs: &[(String, ForecastRequest)],
    ) -> Vec<boq_core::Result<ForecastResponse>> {
        tracing::info!("批次重新預測：{} 個專案", jobs.len());
        jobs.par_iter()
            .map(|(project_id, request)| self.forecast(project_id, request))
            .collect()
    }
}
