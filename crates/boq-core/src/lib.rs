//! # BOQ Core
//!
//! 月度 BOQ 計劃、耗用、庫存等核心資料模型與錯誤類型

pub mod config;
pub mod consumption;
pub mod inventory;
pub mod material;
pub mod plan;

// Re-export 主要類型
pub use config::{ForecastConfig, MaterialUniverse, UnknownMaterialPolicy};
pub use consumption::{ActualConsumption, ConsumptionLedger, ConsumptionRecord};
pub use inventory::{InventoryMatch, InventorySnapshot};
pub use material::{MaterialCatalog, MaterialId};
pub use plan::{MonthEntry, MonthlyPlan};

/// 輸入驗證錯誤（客戶端錯誤，不重試）
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("月度計劃沒有任何月份資料，無法推導物料集合")]
    EmptyPlan,

    #[error("無效的當前月份: {0}（必須為正整數）")]
    InvalidCurrentMonth(String),

    #[error("缺少必要欄位: {0}")]
    MissingField(&'static str),

    #[error("欄位格式錯誤: {field}（{reason}）")]
    MalformedField { field: String, reason: String },

    #[error("數量不可為負: {material} = {quantity}")]
    NegativeQuantity { material: String, quantity: String },

    #[error("無效的物料代碼: {0:?}")]
    InvalidMaterialId(String),

    #[error("物料不在目錄中: {0}")]
    UnknownMaterial(String),

    #[error("月份 {month} 超出計劃期間 1..={total_months}")]
    MonthOutOfRange { month: u32, total_months: u32 },

    #[error("月份重複: {0}")]
    DuplicateMonth(u32),

    #[error("計劃總月數必須為正整數")]
    InvalidTotalMonths,

    #[error("進度係數上下限無效: floor={floor}, ceiling={ceiling}")]
    InvalidProgressBounds { floor: String, ceiling: String },
}

/// BOQ 錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum BoqError {
    #[error("找不到專案的月度計劃: {0}")]
    PlanNotFound(String),

    #[error("找不到資料: {0}")]
    NotFound(String),

    #[error("輸入錯誤: {0}")]
    Input(#[from] InputError),

    #[error("JSON 解析錯誤: {0}")]
    Json(#[from] serde_json::Error),

    #[error("計算錯誤: {0}")]
    Calculation(String),
}

impl BoqError {
    /// 對應的 HTTP 狀態碼
    pub fn status_code(&self) -> u16 {
        match self {
            BoqError::PlanNotFound(_) | BoqError::NotFound(_) => 404,
            BoqError::Input(_) | BoqError::Json(_) => 400,
            BoqError::Calculation(_) => 500,
        }
    }

    /// 呈現給使用者的訊息
    pub fn user_message(&self) -> String {
        match self {
            BoqError::PlanNotFound(_) => {
                "Monthly forecast not found. Please generate the monthly forecast first.".to_string()
            }
            BoqError::Input(
                InputError::MissingField(_)
                | InputError::MalformedField { .. }
                | InputError::InvalidCurrentMonth(_),
            ) => "currentMonth and actualCumulative are required.".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BoqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(BoqError::PlanNotFound("P-1".into()).status_code(), 404);
        assert_eq!(BoqError::Input(InputError::EmptyPlan).status_code(), 400);
        assert_eq!(BoqError::Calculation("x".into()).status_code(), 500);
    }

    #[test]
    fn test_user_messages() {
        let not_found = BoqError::PlanNotFound("P-1".into());
        assert!(not_found.user_message().contains("generate the monthly forecast first"));

        let input = BoqError::from(InputError::MissingField("currentMonth"));
        assert!(input.user_message().contains("currentMonth and actualCumulative"));
    }

    #[test]
    fn test_plan_errors_keep_their_own_message() {
        let duplicate = BoqError::from(InputError::DuplicateMonth(3));
        assert_eq!(duplicate.user_message(), duplicate.to_string());
        assert!(!duplicate.user_message().contains("currentMonth"));

        let unknown = BoqError::from(InputError::UnknownMaterial("Mystery_Item".into()));
        assert!(unknown.user_message().contains("Mystery_Item"));

        let malformed = BoqError::from(InputError::MalformedField {
            field: "actualCumulative".into(),
            reason: "必須為物件".into(),
        });
        assert!(malformed.user_message().contains("currentMonth and actualCumulative"));
    }
}
