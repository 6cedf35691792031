//! 重新預測配置模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::material::MaterialCatalog;
use crate::InputError;

/// 物料集合的推導方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialUniverse {
    /// 只取第一個月份出現的物料
    FirstMonth,
    /// 取所有月份物料的聯集
    Union,
}

/// 目錄外物料的處理政策
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownMaterialPolicy {
    /// 拒絕（回傳輸入錯誤）
    Reject,
    /// 記錄警告後接受
    Warn,
}

/// 重新預測參數配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// 進度係數下限
    pub pf_floor: Decimal,

    /// 進度係數上限
    pub pf_ceiling: Decimal,

    /// 物料集合推導方式
    pub material_universe: MaterialUniverse,

    /// 目錄外物料政策
    pub unknown_material_policy: UnknownMaterialPolicy,

    /// 物料目錄
    pub catalog: MaterialCatalog,
}

impl ForecastConfig {
    /// 創建預設配置（PF 夾在 [0.5, 1.5]）
    pub fn new() -> Self {
        Self {
            pf_floor: Decimal::new(5, 1),
            pf_ceiling: Decimal::new(15, 1),
            material_universe: MaterialUniverse::Union,
            unknown_material_policy: UnknownMaterialPolicy::Warn,
            catalog: MaterialCatalog::builtin(),
        }
    }

    /// 從 JSON 載入並驗證
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置 PF 上下限
    pub fn with_progress_bounds(mut self, floor: Decimal, ceiling: Decimal) -> Self {
        self.pf_floor = floor;
        self.pf_ceiling = ceiling;
        self
    }

    /// 建構器模式：設置物料集合推導方式
    pub fn with_material_universe(mut self, universe: MaterialUniverse) -> Self {
        self.material_universe = universe;
        self
    }

    /// 建構器模式：設置目錄外物料政策
    pub fn with_unknown_material_policy(mut self, policy: UnknownMaterialPolicy) -> Self {
        self.unknown_material_policy = policy;
        self
    }

    /// 建構器模式：設置物料目錄
    pub fn with_catalog(mut self, catalog: MaterialCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// 驗證：0 < floor <= 1 <= ceiling（中性值 1.0 必須落在區間內）
    pub fn validate(&self) -> Result<(), InputError> {
        let valid = self.pf_floor > Decimal::ZERO
            && self.pf_floor <= Decimal::ONE
            && self.pf_ceiling >= Decimal::ONE;

        if valid {
            Ok(())
        } else {
            Err(InputError::InvalidProgressBounds {
                floor: self.pf_floor.to_string(),
                ceiling: self.pf_ceiling.to_string(),
            })
        }
    }

    /// 將 PF 夾在上下限之間
    pub fn clamp_progress_factor(&self, raw: Decimal) -> Decimal {
        raw.max(self.pf_floor).min(self.pf_ceiling)
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self::new()
    }
}
