// ==========================================
// 校务运营管理系统 - 任务事件发布
// ==========================================
// 职责: 定义任务事件发布 trait，实现依赖倒置
// 说明: API 层只依赖 trait，广播实现通过 AppState 注入
// 语义: 发布不阻塞；没有订阅者的主题直接丢弃事件
// ==========================================

use crate::domain::WorkItem;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// 任务事件主题
pub const TASKS_TOPIC: &str = "tasks";

/// 每个主题的广播缓冲容量
pub const DEFAULT_TOPIC_CAPACITY: usize = 256;

// ==========================================
// 任务事件类型
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskEventAction {
    Create,
    Update,
    Delete,
}

impl TaskEventAction {
    pub fn as_str(&self) -> &str {
        match self {
            TaskEventAction::Create => "create",
            TaskEventAction::Update => "update",
            TaskEventAction::Delete => "delete",
        }
    }
}

/// 任务事件
///
/// 删除事件不携带任务快照，只有 task_id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub action: TaskEventAction,
    pub task: Option<WorkItem>,
    pub task_id: String,
}

impl TaskEvent {
    pub fn created(task: WorkItem) -> Self {
        Self {
            action: TaskEventAction::Create,
            task_id: task.task_id.clone(),
            task: Some(task),
        }
    }

    pub fn updated(task: WorkItem) -> Self {
        Self {
            action: TaskEventAction::Update,
            task_id: task.task_id.clone(),
            task: Some(task),
        }
    }

    pub fn deleted(task_id: impl Into<String>) -> Self {
        Self {
            action: TaskEventAction::Delete,
            task: None,
            task_id: task_id.into(),
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 任务事件发布者 Trait
pub trait TaskEventPublisher: Send + Sync {
    /// 发布事件到主题
    ///
    /// # 返回
    /// - `Ok(n)`: 收到事件的订阅者数量 (可以为 0)
    /// - `Err`: 发布失败
    fn publish(&self, topic: &str, event: TaskEvent) -> Result<usize, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl TaskEventPublisher for NoOpEventPublisher {
    fn publish(&self, topic: &str, event: TaskEvent) -> Result<usize, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - topic={}, action={}, task_id={}",
            topic,
            event.action.as_str(),
            event.task_id
        );
        Ok(0)
    }
}

/// 可选的事件发布者包装
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn TaskEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn TaskEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    pub fn publish(&self, topic: &str, event: TaskEvent) -> Result<usize, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(topic, event),
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - topic={}, task_id={}",
                    topic,
                    event.task_id
                );
                Ok(0)
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

// ==========================================
// 进程内广播实现
// ==========================================

/// InMemoryTaskEventHub - 每个主题一个 tokio broadcast 通道
pub struct InMemoryTaskEventHub {
    capacity: usize,
    topics: Mutex<HashMap<String, broadcast::Sender<TaskEvent>>>,
}

impl InMemoryTaskEventHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TOPIC_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: Mutex::new(HashMap::new()),
        }
    }

    /// 订阅主题；主题不存在时创建
    pub fn subscribe(&self, topic: &str) -> Result<broadcast::Receiver<TaskEvent>, Box<dyn Error + Send + Sync>> {
        let mut topics = self
            .topics
            .lock()
            .map_err(|e| format!("事件主题锁获取失败: {}", e))?;
        let sender = topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        Ok(sender.subscribe())
    }

    /// 当前主题订阅者数量
    pub fn subscriber_count(&self, topic: &str) -> usize {
        match self.topics.lock() {
            Ok(topics) => topics.get(topic).map(|s| s.receiver_count()).unwrap_or(0),
            Err(_) => 0,
        }
    }
}

impl Default for InMemoryTaskEventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskEventPublisher for InMemoryTaskEventHub {
    fn publish(&self, topic: &str, event: TaskEvent) -> Result<usize, Box<dyn Error + Send + Sync>> {
        let topics = self
            .topics
            .lock()
            .map_err(|e| format!("事件主题锁获取失败: {}", e))?;

        let Some(sender) = topics.get(topic) else {
            tracing::debug!(topic, task_id = %event.task_id, "no subscribers, event dropped");
            return Ok(0);
        };

        // send 仅在没有接收者时失败
        match sender.send(event) {
            Ok(delivered) => Ok(delivered),
            Err(broadcast::error::SendError(event)) => {
                tracing::debug!(topic, task_id = %event.task_id, "all subscribers gone, event dropped");
                Ok(0)
            }
        }
    }
}
