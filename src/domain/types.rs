// ==========================================
// 罩套定价系统 - 领域类型定义
// ==========================================
// 变体 = 面料等级 × 衬垫选项，固定 4 种
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 面料等级 (Fabric Grade)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FabricGrade {
    Choice,  // 标准面料
    Premium, // 高级面料
}

impl FabricGrade {
    /// 该等级对应的面料角色
    pub fn fabric_role(self) -> MaterialRole {
        match self {
            FabricGrade::Choice => MaterialRole::ChoiceFabric,
            FabricGrade::Premium => MaterialRole::PremiumFabric,
        }
    }
}

// ==========================================
// 变体键 (Variant Key)
// ==========================================
// 序列化格式: snake_case (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKey {
    ChoiceNoPadding,
    ChoicePadded,
    PremiumNoPadding,
    PremiumPadded,
}

impl VariantKey {
    /// 固定计算顺序
    pub const ALL: [VariantKey; 4] = [
        VariantKey::ChoiceNoPadding,
        VariantKey::ChoicePadded,
        VariantKey::PremiumNoPadding,
        VariantKey::PremiumPadded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VariantKey::ChoiceNoPadding => "choice_no_padding",
            VariantKey::ChoicePadded => "choice_padded",
            VariantKey::PremiumNoPadding => "premium_no_padding",
            VariantKey::PremiumPadded => "premium_padded",
        }
    }

    pub fn fabric_grade(self) -> FabricGrade {
        match self {
            VariantKey::ChoiceNoPadding | VariantKey::ChoicePadded => FabricGrade::Choice,
            VariantKey::PremiumNoPadding | VariantKey::PremiumPadded => FabricGrade::Premium,
        }
    }

    pub fn is_padded(self) -> bool {
        matches!(self, VariantKey::ChoicePadded | VariantKey::PremiumPadded)
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VariantKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "choice_no_padding" => Ok(VariantKey::ChoiceNoPadding),
            "choice_padded" => Ok(VariantKey::ChoicePadded),
            "premium_no_padding" => Ok(VariantKey::PremiumNoPadding),
            "premium_padded" => Ok(VariantKey::PremiumPadded),
            other => Err(format!("未知变体: {}", other)),
        }
    }
}

// ==========================================
// 材料角色 (Material Role)
// ==========================================
// 抽象角色 → 具体材料的映射由 material_role_assignment 维护
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialRole {
    ChoiceFabric,  // 主防水面料
    PremiumFabric, // 高级皮革面料
    Padding,       // 衬垫
}

impl MaterialRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MaterialRole::ChoiceFabric => "choice_fabric",
            MaterialRole::PremiumFabric => "premium_fabric",
            MaterialRole::Padding => "padding",
        }
    }
}

impl fmt::Display for MaterialRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MaterialRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "choice_fabric" => Ok(MaterialRole::ChoiceFabric),
            "premium_fabric" => Ok(MaterialRole::PremiumFabric),
            "padding" => Ok(MaterialRole::Padding),
            other => Err(format!("未知材料角色: {}", other)),
        }
    }
}

// ==========================================
// 运费模式 (Shipping Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMode {
    Flat,       // 固定运费
    Calculated, // 按重量档位计算
    FixedCell,  // 假定档位（忽略实际重量）
}

impl ShippingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ShippingMode::Flat => "flat",
            ShippingMode::Calculated => "calculated",
            ShippingMode::FixedCell => "fixed_cell",
        }
    }
}

impl fmt::Display for ShippingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ShippingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flat" => Ok(ShippingMode::Flat),
            "calculated" => Ok(ShippingMode::Calculated),
            "fixed_cell" => Ok(ShippingMode::FixedCell),
            other => Err(format!("未知运费模式: {}", other)),
        }
    }
}

// ==========================================
// 变化方向 (Change Direction)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeDirection {
    Increase,
    Decrease,
}

impl fmt::Display for ChangeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeDirection::Increase => write!(f, "increase"),
            ChangeDirection::Decrease => write!(f, "decrease"),
        }
    }
}
