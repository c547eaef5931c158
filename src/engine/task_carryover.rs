// ==========================================
// 校务运营管理系统 - 任务结转过滤
// ==========================================
// 输入: 已按权限范围过滤的任务 + 锚点日报 (可选)
// 规则:
//   - 无锚点 → 全部可见
//   - 有锚点 → 仅隐藏 "已完成 且 created_at ≤ 锚点 created_at" 的任务
// 输出: 按 created_at 降序
// ==========================================

use crate::domain::{ReportSubmission, WorkItem};

/// 结转过滤结果
#[derive(Debug, Clone)]
pub struct CarryoverResult {
    pub anchor_report_id: Option<String>,
    pub visible: Vec<WorkItem>,
    pub suppressed_count: usize,
}

/// TaskCarryoverFilter - 任务结转过滤器
#[derive(Debug, Clone, Default)]
pub struct TaskCarryoverFilter;

impl TaskCarryoverFilter {
    pub fn new() -> Self {
        Self
    }

    /// 单个任务是否可见
    pub fn is_visible(task: &WorkItem, anchor: Option<&ReportSubmission>) -> bool {
        match anchor {
            None => true,
            Some(anchor) => task.created_at > anchor.created_at || !task.is_completed(),
        }
    }

    /// 过滤任务
    pub fn filter(&self, tasks: Vec<WorkItem>, anchor: Option<&ReportSubmission>) -> CarryoverResult {
        let total = tasks.len();
        let mut visible: Vec<WorkItem> = tasks
            .into_iter()
            .filter(|task| Self::is_visible(task, anchor))
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let suppressed_count = total - visible.len();
        tracing::debug!(
            anchor = ?anchor.map(|a| a.report_id.as_str()),
            total,
            suppressed_count,
            "task carryover filtered"
        );

        CarryoverResult {
            anchor_report_id: anchor.map(|a| a.report_id.clone()),
            visible,
            suppressed_count,
        }
    }
}
