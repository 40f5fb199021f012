// ==========================================
// 现场服务运营调度系统 - 筛选求值引擎
// ==========================================
// 职责: FilterDefinition 对单个工单的命中判定
// 红线: 结构化定义是唯一事实——本地重过滤与后端查询
//       翻译共用同一对象，禁止另写临时过滤逻辑
// ==========================================
// 口径: 维度间 AND，维度内集合成员 OR，缺省维度恒满足
// ==========================================

use crate::domain::filter::FilterDefinition;
use crate::domain::work_order::WorkOrder;

// ==========================================
// CriteriaEvaluator - 筛选求值引擎
// ==========================================
// 无状态纯函数引擎
pub struct CriteriaEvaluator;

impl CriteriaEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// 判定工单是否命中筛选条件
    pub fn matches(&self, def: &FilterDefinition, order: &WorkOrder) -> bool {
        if let Some(category) = def.category {
            if order.category != category {
                return false;
            }
        }

        if !def.status_codes.is_empty() && !def.status_codes.contains(&order.status_code) {
            return false;
        }

        if !def.subject_ids.is_empty() && !def.subject_ids.contains(&order.subject_id) {
            return false;
        }

        true
    }

    /// 对已取回批次做本地重过滤（保持输入顺序）
    pub fn filter_batch<'a>(
        &self,
        def: &FilterDefinition,
        orders: &'a [WorkOrder],
    ) -> Vec<&'a WorkOrder> {
        orders
            .iter()
            .filter(|order| self.matches(def, order))
            .collect()
    }
}

impl Default for CriteriaEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Category;
    use chrono::NaiveDate;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    /// 创建测试用工单
    fn create_test_order(id: &str, status_code: &str, subject_id: &str, category: Category) -> WorkOrder {
        WorkOrder {
            id: id.to_string(),
            scheduled_at: None,
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            time: Some("09:00".to_string()),
            status_code: status_code.to_string(),
            status_label: String::new(),
            subject_id: subject_id.to_string(),
            category,
            customer_id: None,
            branch_id: Some("1".to_string()),
            customer_name: Some("Cliente Teste".to_string()),
            neighborhood: None,
            city: None,
            protocol: None,
            opened_at: None,
            closed_at: None,
        }
    }

    #[test]
    fn test_empty_definition_matches_everything() {
        let evaluator = CriteriaEvaluator::new();
        let def = FilterDefinition::default();
        for category in [Category::Installation, Category::Maintenance, Category::Other] {
            let order = create_test_order("1", "AG", "17", category);
            assert!(evaluator.matches(&def, &order));
        }
    }

    #[test]
    fn test_category_exact_match() {
        let evaluator = CriteriaEvaluator::new();
        let def = FilterDefinition {
            category: Some(Category::Installation),
            ..Default::default()
        };
        let install = create_test_order("1", "AG", "1", Category::Installation);
        let maint = create_test_order("2", "AG", "17", Category::Maintenance);
        assert!(evaluator.matches(&def, &install));
        assert!(!evaluator.matches(&def, &maint));
    }

    #[test]
    fn test_status_membership_is_or() {
        let evaluator = CriteriaEvaluator::new();
        let def = FilterDefinition {
            status_codes: ["F".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let orders = [
            create_test_order("1", "F", "17", Category::Maintenance),
            create_test_order("2", "AG", "17", Category::Maintenance),
            create_test_order("3", "F", "31", Category::Maintenance),
        ];
        let hits = evaluator.filter_batch(&def, &orders);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "1");
        assert_eq!(hits[1].id, "3");
    }

    #[test]
    fn test_dimensions_are_anded() {
        let evaluator = CriteriaEvaluator::new();
        let def = FilterDefinition {
            category: Some(Category::Maintenance),
            status_codes: ["AG".to_string(), "RAG".to_string()].into_iter().collect(),
            subject_ids: ["17".to_string()].into_iter().collect(),
        };
        // 全命中
        assert!(evaluator.matches(&def, &create_test_order("1", "AG", "17", Category::Maintenance)));
        // 单维失配即整体失配
        assert!(!evaluator.matches(&def, &create_test_order("2", "F", "17", Category::Maintenance)));
        assert!(!evaluator.matches(&def, &create_test_order("3", "AG", "34", Category::Maintenance)));
        assert!(!evaluator.matches(&def, &create_test_order("4", "AG", "17", Category::Installation)));
    }
}
