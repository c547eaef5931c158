// ==========================================
// 校务运营管理系统 - 日报生命周期
// ==========================================
// 状态: draft (初始) ⇄ completed
//   complete: draft → completed
//   reopen:   completed → draft
// 锚点: 同一作者、created_at 严格早于当前日报、查询时状态为 completed
//       的日报中 created_at 最大者；没有则无锚点
// 说明: 锚点按"当前是否已完成"计算，已完成日报被重新打开后，
//       下一次查询会回退到更早的锚点
// ==========================================

use crate::domain::{ReportStatus, ReportSubmission};

/// 生命周期动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Complete,
    Reopen,
}

impl LifecycleAction {
    pub fn target(&self) -> ReportStatus {
        match self {
            LifecycleAction::Complete => ReportStatus::Completed,
            LifecycleAction::Reopen => ReportStatus::Draft,
        }
    }
}

/// 计算动作后的状态；返回 None 表示状态不变
pub fn apply_action(current: ReportStatus, action: LifecycleAction) -> Option<ReportStatus> {
    let target = action.target();
    if current == target {
        None
    } else {
        Some(target)
    }
}

/// 选出当前日报的结转锚点
///
/// # 参数
/// - `history`: 候选日报 (可以包含其他作者、包含当前日报本身)
/// - `current`: 当前日报
pub fn select_anchor<'a>(
    history: &'a [ReportSubmission],
    current: &ReportSubmission,
) -> Option<&'a ReportSubmission> {
    history
        .iter()
        .filter(|r| r.employee_id == current.employee_id)
        .filter(|r| r.report_id != current.report_id)
        .filter(|r| r.created_at < current.created_at)
        .filter(|r| r.is_completed())
        .max_by_key(|r| r.created_at)
}
