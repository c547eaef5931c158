// ==========================================
// 校务运营管理系统 - 周课表展开引擎
// ==========================================
// 输入: 班级 (开课日期) + 周课表规则 + 展开区间 + 已有课次日期快照
// 输出: 待新增的具体课次 (纯计算，不写库)
// 区间: end_date 优先；否则 anchor + 30×months 天；否则 anchor + 90 天
//       (按 30 天/月近似，沿用历史口径)
// 规则:
//   - 逐日遍历 [anchor, horizon]，每天检查每条规则的星期是否匹配
//   - 快照里已有课次的日期跳过；快照在遍历前计算，本次新增不回写快照
//   - 同一天匹配多条规则时会生成多节课 (已知行为)
//   - 星期名称无法识别的规则静默跳过，不中断整个班级
// ==========================================

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Group, LessonOccurrence, RecurringSlot};

/// 默认每月折算天数
pub const DEFAULT_DAYS_PER_MONTH: i64 = 30;
/// 未指定区间时的默认展开天数
pub const DEFAULT_HORIZON_DAYS: i64 = 90;
/// 单次展开最多覆盖的天数 (120 个月 × 30 天)
pub const DEFAULT_MAX_HORIZON_DAYS: i64 = 3_600;

/// 展开前置条件错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpansionError {
    #[error("missing start date")]
    MissingStartDate,

    #[error("missing schedule")]
    MissingSchedule,

    /// 区间超过单次展开上限 (或日期运算溢出)
    #[error("horizon exceeds {max_days} days")]
    HorizonTooFar { max_days: i64 },
}

/// 展开区间请求
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonRequest {
    pub end_date: Option<NaiveDate>,
    pub months: Option<u32>,
}

impl HorizonRequest {
    pub fn until(end_date: NaiveDate) -> Self {
        Self {
            end_date: Some(end_date),
            months: None,
        }
    }

    pub fn months(months: u32) -> Self {
        Self {
            end_date: None,
            months: Some(months),
        }
    }
}

/// 展开参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionConfig {
    pub days_per_month: i64,
    pub default_horizon_days: i64,
    /// anchor 到 horizon 的最大天数，对 end_date / months / 默认区间一律生效
    pub max_horizon_days: i64,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            days_per_month: DEFAULT_DAYS_PER_MONTH,
            default_horizon_days: DEFAULT_HORIZON_DAYS,
            max_horizon_days: DEFAULT_MAX_HORIZON_DAYS,
        }
    }
}

/// 展开结果
#[derive(Debug, Clone)]
pub struct ExpansionPlan {
    pub anchor: NaiveDate,
    pub horizon: NaiveDate,
    /// 按日期升序，同日按规则顺序
    pub lessons: Vec<LessonOccurrence>,
    /// 星期名称无法识别而被跳过的规则
    pub skipped_slot_ids: Vec<String>,
}

// ==========================================
// LessonExpander - 周课表展开器
// ==========================================
pub struct LessonExpander {
    config: ExpansionConfig,
}

impl LessonExpander {
    pub fn new(config: ExpansionConfig) -> Self {
        Self { config }
    }

    /// 计算展开终点
    ///
    /// months = 0 视为未指定 (沿用历史行为)
    ///
    /// # 返回
    /// - Err(HorizonTooFar): 区间超过 max_horizon_days，或天数换算溢出
    pub fn resolve_horizon(
        &self,
        anchor: NaiveDate,
        request: &HorizonRequest,
    ) -> Result<NaiveDate, ExpansionError> {
        let too_far = ExpansionError::HorizonTooFar {
            max_days: self.config.max_horizon_days,
        };

        if let Some(end_date) = request.end_date {
            if (end_date - anchor).num_days() > self.config.max_horizon_days {
                return Err(too_far);
            }
            return Ok(end_date);
        }

        let days = match request.months {
            Some(months) if months > 0 => self
                .config
                .days_per_month
                .checked_mul(i64::from(months))
                .ok_or_else(|| too_far.clone())?,
            _ => self.config.default_horizon_days,
        };
        if days > self.config.max_horizon_days {
            return Err(too_far);
        }

        Duration::try_days(days)
            .and_then(|span| anchor.checked_add_signed(span))
            .ok_or(too_far)
    }

    /// 校验前置条件，返回开课日期
    pub fn check_preconditions(
        &self,
        group: &Group,
        slots: &[RecurringSlot],
    ) -> Result<NaiveDate, ExpansionError> {
        let anchor = group.start_date.ok_or(ExpansionError::MissingStartDate)?;
        if slots.is_empty() {
            return Err(ExpansionError::MissingSchedule);
        }
        Ok(anchor)
    }

    /// 展开课表
    ///
    /// # 参数
    /// - `group`: 班级 (需有开课日期)
    /// - `slots`: 班级的周课表规则 (至少一条)
    /// - `existing_dates`: 展开前已存在课次的日期
    /// - `request`: 展开区间
    pub fn expand(
        &self,
        group: &Group,
        slots: &[RecurringSlot],
        existing_dates: &HashSet<NaiveDate>,
        request: &HorizonRequest,
    ) -> Result<ExpansionPlan, ExpansionError> {
        let anchor = self.check_preconditions(group, slots)?;
        let horizon = self.resolve_horizon(anchor, request)?;

        let mut skipped_slot_ids = Vec::new();
        let resolved: Vec<(&RecurringSlot, chrono::Weekday)> = slots
            .iter()
            .filter_map(|slot| match slot.weekday() {
                Some(weekday) => Some((slot, weekday)),
                None => {
                    tracing::warn!(
                        group_id = %group.group_id,
                        slot_id = %slot.slot_id,
                        day_of_week = %slot.day_of_week,
                        "unrecognized weekday name, slot skipped"
                    );
                    skipped_slot_ids.push(slot.slot_id.clone());
                    None
                }
            })
            .collect();

        let mut lessons = Vec::new();
        for date in anchor.iter_days().take_while(|d| *d <= horizon) {
            if existing_dates.contains(&date) {
                continue;
            }
            for (slot, weekday) in &resolved {
                if date.weekday() == *weekday {
                    lessons.push(LessonOccurrence::scheduled(
                        &group.group_id,
                        date,
                        slot.start_time,
                        slot.duration_minutes,
                    ));
                }
            }
        }

        tracing::debug!(
            group_id = %group.group_id,
            %anchor,
            %horizon,
            generated = lessons.len(),
            skipped_slots = skipped_slot_ids.len(),
            "lesson expansion planned"
        );

        Ok(ExpansionPlan {
            anchor,
            horizon,
            lessons,
            skipped_slot_ids,
        })
    }
}

impl Default for LessonExpander {
    fn default() -> Self {
        Self::new(ExpansionConfig::default())
    }
}
