// ==========================================
// 罩套定价系统 - 产品与材料领域模型
// ==========================================
// 红线: surface_area_sq_in 由外部预计算，本引擎只读不重算
// ==========================================

use crate::domain::types::MaterialRole;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Model - 产品型号
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub name: String,
    pub width_in: Option<f64>,
    pub depth_in: Option<f64>,
    pub height_in: Option<f64>,
    pub surface_area_sq_in: Option<f64>, // 表面积(平方英寸)，外部预计算
}

impl Model {
    /// 有效表面积（缺失、非正数、非有限数均视为无效）
    pub fn valid_surface_area(&self) -> Option<f64> {
        self.surface_area_sq_in
            .filter(|area| area.is_finite() && *area > 0.0)
    }
}

// ==========================================
// Material - 材料
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: i64,
    pub name: String,
    pub linear_yard_width_in: Option<f64>, // 每码幅宽(英寸)
    pub weight_per_sq_in_oz: Option<f64>,  // 单位面积重量(盎司/平方英寸)
}

// ==========================================
// MaterialSupplierLink - 材料供应商报价
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSupplierLink {
    pub id: i64,
    pub material_id: i64,
    pub supplier_id: i64,
    pub unit_cost_dollars: f64, // 每线性码单价(美元)
    pub is_preferred: bool,
}

// ==========================================
// MaterialRoleAssignment - 材料角色分配（时间生效）
// ==========================================
// 同一角色任一时刻最多一行 end_date 为空；被替换时只写 end_date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRoleAssignment {
    pub id: i64,
    pub role: MaterialRole,
    pub material_id: i64,
    pub effective_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with_area(area: Option<f64>) -> Model {
        Model {
            id: 1,
            name: "grand piano cover".to_string(),
            width_in: Some(60.0),
            depth_in: Some(70.0),
            height_in: Some(40.0),
            surface_area_sq_in: area,
        }
    }

    #[test]
    fn test_valid_surface_area() {
        assert_eq!(model_with_area(Some(200.0)).valid_surface_area(), Some(200.0));
        assert_eq!(model_with_area(Some(0.0)).valid_surface_area(), None);
        assert_eq!(model_with_area(Some(-3.0)).valid_surface_area(), None);
        assert_eq!(model_with_area(Some(f64::NAN)).valid_surface_area(), None);
        assert_eq!(model_with_area(None).valid_surface_area(), None);
    }
}
