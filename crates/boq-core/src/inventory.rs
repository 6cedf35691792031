//! 庫存快照模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::material::MaterialId;

/// 庫存查詢結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryMatch {
    /// 實際對應到的庫存品項名稱
    pub item: String,

    /// 現有庫存
    pub on_hand_qty: Decimal,

    /// 是否為精確比對（非子字串比對）
    pub exact: bool,
}

/// 專案庫存快照（品項 → 現有數量）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// 專案ID
    pub project_id: String,

    /// 品項名稱 → 現有數量
    pub items: BTreeMap<String, Decimal>,
}

impl InventorySnapshot {
    /// 創建空的庫存快照
    pub fn new(project_id: String) -> Self {
        Self {
            project_id,
            items: BTreeMap::new(),
        }
    }

    /// 建構器模式：加入品項
    pub fn with_item(mut self, item: impl Into<String>, on_hand_qty: Decimal) -> Self {
        self.items.insert(item.into(), on_hand_qty);
        self
    }

    /// 依物料代碼找出對應的庫存品項
    ///
    /// 兩邊都先正規化（小寫、空白轉底線），先找完全相同者，
    /// 再找互相包含者；多筆符合時取品項名稱排序最前者。
    pub fn resolve(&self, material: &MaterialId) -> Option<InventoryMatch> {
        let wanted = normalize(material.as_str());

        let normalized: Vec<(&String, String, Decimal)> = self
            .items
            .iter()
            .map(|(item, qty)| (item, normalize(item), *qty))
            .filter(|(_, key, _)| !key.is_empty())
            .collect();

        if let Some((item, _, qty)) = normalized.iter().find(|(_, key, _)| *key == wanted) {
            return Some(InventoryMatch {
                item: (*item).clone(),
                on_hand_qty: *qty,
                exact: true,
            });
        }

        let fuzzy = normalized
            .iter()
            .find(|(_, key, _)| key.contains(&wanted) || wanted.contains(key.as_str()));

        match fuzzy {
            Some((item, _, qty)) => {
                tracing::debug!("物料 {} 以模糊比對對應到庫存品項 {}", material, item);
                Some(InventoryMatch {
                    item: (*item).clone(),
                    on_hand_qty: *qty,
                    exact: false,
                })
            }
            None => None,
        }
    }
}

/// 正規化品項名稱：小寫、連續空白轉為單一底線
fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}
