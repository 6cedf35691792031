//! 物料代碼與物料目錄

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::config::UnknownMaterialPolicy;
use crate::InputError;

/// 輸配電工程 BOQ 內建物料目錄
pub const BUILTIN_MATERIALS: [&str; 33] = [
    "ACSR_Moose_tons",
    "ACSR_Zebra_tons",
    "ACSR_Panther_tons",
    "AAAC_Conductor_tons",
    "Earthwire_GSW_tons",
    "OPGW_Cable_km",
    "Tower_Steel_MT",
    "Tower_Bolts_Nuts_MT",
    "Stub_Sets_Nos",
    "Insulator_Disc_Nos",
    "Insulator_Polymer_Nos",
    "Hardware_Fittings_Sets",
    "Conductor_Accessories_Sets",
    "Spacer_Damper_Nos",
    "Vibration_Damper_Nos",
    "Cement_MT",
    "Sand_CUM",
    "Aggregate_CUM",
    "Reinforcement_Steel_MT",
    "Earthing_Material_MT",
    "Power_Transformer_Nos",
    "Shunt_Reactor_Nos",
    "Circuit_Breaker_Nos",
    "Isolator_Nos",
    "Current_Transformer_Nos",
    "Potential_Transformer_Nos",
    "Lightning_Arrester_Nos",
    "Control_Relay_Panel_Nos",
    "Control_Cable_km",
    "Power_Cable_km",
    "Busbar_Tubular_MT",
    "Gantry_Structure_MT",
    "Danger_Plate_Nos",
];

/// 物料代碼（例如 `ACSR_Moose_tons`）
///
/// 只接受 ASCII 英數字與 `_ - . / ( )`，前後空白會被去除。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MaterialId(String);

impl MaterialId {
    /// 解析並驗證物料代碼
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let trimmed = raw.trim();
        let valid = !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | '(' | ')'));

        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(InputError::InvalidMaterialId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MaterialId {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MaterialId {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MaterialId> for String {
    fn from(id: MaterialId) -> Self {
        id.0
    }
}

/// 物料目錄（已知的 BOQ 物料集合）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialCatalog {
    materials: BTreeSet<MaterialId>,
}

impl MaterialCatalog {
    /// 以指定物料建立目錄
    pub fn new(materials: impl IntoIterator<Item = MaterialId>) -> Self {
        Self {
            materials: materials.into_iter().collect(),
        }
    }

    /// 內建目錄
    pub fn builtin() -> Self {
        Self {
            materials: BUILTIN_MATERIALS
                .iter()
                .map(|name| MaterialId(name.to_string()))
                .collect(),
        }
    }

    pub fn contains(&self, material: &MaterialId) -> bool {
        self.materials.contains(material)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// 依政策決定是否接受目錄外的物料
    pub fn admit(
        &self,
        material: &MaterialId,
        policy: UnknownMaterialPolicy,
    ) -> Result<(), InputError> {
        if self.contains(material) {
            return Ok(());
        }

        match policy {
            UnknownMaterialPolicy::Reject => Err(InputError::UnknownMaterial(material.to_string())),
            UnknownMaterialPolicy::Warn => {
                tracing::warn!("物料 {} 不在目錄中，仍予接受", material);
                Ok(())
            }
        }
    }
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ACSR_Moose_tons", "ACSR_Moose_tons")]
    #[case("  Cement_MT ", "Cement_MT")]
    #[case("Insulator-120kN", "Insulator-120kN")]
    #[case("Cable(4C/16sqmm)", "Cable(4C/16sqmm)")]
    fn test_parse_valid(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(MaterialId::parse(raw).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("Tower Steel")]
    #[case("Cement;DROP")]
    fn test_parse_invalid(#[case] raw: &str) {
        assert_eq!(
            MaterialId::parse(raw),
            Err(InputError::InvalidMaterialId(raw.to_string()))
        );
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = MaterialCatalog::builtin();
        assert_eq!(catalog.len(), 33);
        assert!(catalog.contains(&MaterialId::parse("Cement_MT").unwrap()));
    }

    #[test]
    fn test_admit_policy() {
        let catalog = MaterialCatalog::builtin();
        let unknown = MaterialId::parse("Mystery_Item").unwrap();

        assert!(catalog.admit(&unknown, UnknownMaterialPolicy::Warn).is_ok());
        assert_eq!(
            catalog.admit(&unknown, UnknownMaterialPolicy::Reject),
            Err(InputError::UnknownMaterial("Mystery_Item".to_string()))
        );
    }

    #[test]
    fn test_serde_roundtrip_rejects_invalid() {
        let id: MaterialId = serde_json::from_str("\"OPGW_Cable_km\"").unwrap();
        assert_eq!(id.as_str(), "OPGW_Cable_km");
        assert!(serde_json::from_str::<MaterialId>("\"bad name\"").is_err());
    }
}
