//! 审计日志模块
//!
//! 记录 Token 的签发与验证事件，包括：
//!
//! - **安全事件**: 签发、验证通过、被拒绝、过期
//! - **审计日志 Trait**: 定义日志记录接口
//! - **内置实现**: 内存（测试/开发）、`tracing` 转发、空操作
//!
//! 事件中只包含用户 ID 和拒绝原因，永远不包含签名密钥或 Token 签名。
//!
//! ## 使用示例
//!
//! ```rust
//! use passport_token::audit::{AuditLogger, EventType, InMemoryAuditLogger, SecurityEvent};
//! use passport_token::token::RejectReason;
//!
//! let logger = InMemoryAuditLogger::new();
//!
//! logger.log(SecurityEvent::token_issued("alice", 1_700_003_600));
//! logger.log(SecurityEvent::token_rejected(RejectReason::InvalidSignature));
//!
//! assert_eq!(logger.event_count(), 2);
//! assert_eq!(logger.get_events_by_type(&EventType::TokenRejected).len(), 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use crate::token::RejectReason;

/// 事件严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EventSeverity {
    /// 调试信息
    Debug,
    /// 一般信息
    #[default]
    Info,
    /// 警告
    Warning,
    /// 错误
    Error,
    /// 严重/危险
    Critical,
}

impl std::fmt::Display for EventSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventSeverity::Debug => write!(f, "DEBUG"),
            EventSeverity::Info => write!(f, "INFO"),
            EventSeverity::Warning => write!(f, "WARNING"),
            EventSeverity::Error => write!(f, "ERROR"),
            EventSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// 安全事件类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Token 签发
    TokenIssued,
    /// Token 验证通过
    TokenVerified,
    /// Token 被拒绝（格式、签名或过期时间无效）
    TokenRejected,
    /// Token 已过期
    TokenExpired,
    /// 自定义事件
    Custom(String),
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::TokenIssued => write!(f, "token_issued"),
            EventType::TokenVerified => write!(f, "token_verified"),
            EventType::TokenRejected => write!(f, "token_rejected"),
            EventType::TokenExpired => write!(f, "token_expired"),
            EventType::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

/// 安全事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    /// 事件 ID
    pub id: String,
    /// 事件类型
    pub event_type: EventType,
    /// 严重程度
    pub severity: EventSeverity,
    /// 用户 ID（如果适用）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// 事件消息/描述
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// 额外详情
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, String>,
    /// 事件时间
    pub timestamp: DateTime<Utc>,
}

impl SecurityEvent {
    /// 创建新的安全事件
    pub fn new(event_type: EventType, severity: EventSeverity) -> Self {
        Self {
            id: generate_event_id(),
            event_type,
            severity,
            user_id: None,
            message: None,
            details: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// 创建自定义事件
    pub fn custom(name: impl Into<String>, severity: EventSeverity) -> Self {
        Self::new(EventType::Custom(name.into()), severity)
    }

    // ========================================================================
    // 便捷构造方法
    // ========================================================================

    /// 创建 Token 签发事件
    pub fn token_issued(user_id: impl Into<String>, expires_at: i64) -> Self {
        Self::new(EventType::TokenIssued, EventSeverity::Info)
            .with_user_id(user_id)
            .with_detail("expires_at", expires_at.to_string())
            .with_message("Token issued")
    }

    /// 创建 Token 验证通过事件
    pub fn token_verified(user_id: impl Into<String>) -> Self {
        Self::new(EventType::TokenVerified, EventSeverity::Debug)
            .with_user_id(user_id)
            .with_message("Token verified")
    }

    /// 创建 Token 被拒绝事件
    ///
    /// 过期单独记录为 [`EventType::TokenExpired`]（Info 级别），
    /// 其余原因记录为 [`EventType::TokenRejected`]（Warning 级别）。
    pub fn token_rejected(reason: RejectReason) -> Self {
        let event = match reason {
            RejectReason::Expired => Self::new(EventType::TokenExpired, EventSeverity::Info),
            _ => Self::new(EventType::TokenRejected, EventSeverity::Warning),
        };
        event
            .with_detail("reason", reason.as_str())
            .with_message(format!("Token rejected: {}", reason))
    }

    // ========================================================================
    // Builder 方法
    // ========================================================================

    /// 设置用户 ID
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// 设置消息
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// 添加详情
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// 设置严重程度
    pub fn with_severity(mut self, severity: EventSeverity) -> Self {
        self.severity = severity;
        self
    }

    // ========================================================================
    // 查询方法
    // ========================================================================

    /// 获取事件类型名称
    pub fn event_name(&self) -> String {
        self.event_type.to_string()
    }

    /// 检查是否是高严重程度事件
    pub fn is_high_severity(&self) -> bool {
        matches!(
            self.severity,
            EventSeverity::Error | EventSeverity::Critical
        )
    }

    /// 检查是否是验证失败事件
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.event_type,
            EventType::TokenRejected | EventType::TokenExpired
        )
    }
}

/// 生成事件 ID
fn generate_event_id() -> String {
    use crate::random::generate_random_hex;
    format!(
        "evt_{}",
        generate_random_hex(16).unwrap_or_else(|_| "unknown".to_string())
    )
}

// ============================================================================
// AuditLogger Trait
// ============================================================================

/// 审计日志记录器 trait
pub trait AuditLogger: Send + Sync {
    /// 记录安全事件
    fn log(&self, event: SecurityEvent);
}

// ============================================================================
// InMemoryAuditLogger
// ============================================================================

/// 内存审计日志记录器
///
/// 用于测试和开发环境，将事件存储在内存中。克隆后共享同一份存储。
#[derive(Debug, Default, Clone)]
pub struct InMemoryAuditLogger {
    events: Arc<RwLock<VecDeque<SecurityEvent>>>,
    max_events: Option<usize>,
}

impl InMemoryAuditLogger {
    /// 创建新的内存日志记录器
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带有最大事件数限制的日志记录器
    ///
    /// `max` 为 0 时不保留任何事件。
    pub fn with_max_events(max: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(VecDeque::new())),
            max_events: Some(max),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, VecDeque<SecurityEvent>> {
        self.events.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn filtered(&self, predicate: impl Fn(&SecurityEvent) -> bool) -> Vec<SecurityEvent> {
        self.read().iter().filter(|e| predicate(e)).cloned().collect()
    }

    /// 获取所有事件
    pub fn get_events(&self) -> Vec<SecurityEvent> {
        self.read().iter().cloned().collect()
    }

    /// 获取事件数量
    pub fn event_count(&self) -> usize {
        self.read().len()
    }

    /// 按用户 ID 获取事件
    pub fn get_events_by_user(&self, user_id: &str) -> Vec<SecurityEvent> {
        self.filtered(|e| e.user_id.as_deref() == Some(user_id))
    }

    /// 按事件类型获取事件
    pub fn get_events_by_type(&self, event_type: &EventType) -> Vec<SecurityEvent> {
        self.filtered(|e| &e.event_type == event_type)
    }

    /// 按严重程度获取事件
    pub fn get_events_by_severity(&self, severity: EventSeverity) -> Vec<SecurityEvent> {
        self.filtered(|e| e.severity == severity)
    }

    /// 获取统计信息
    pub fn get_stats(&self) -> AuditStats {
        let events = self.read();
        let mut stats = AuditStats {
            total_events: events.len(),
            ..Default::default()
        };

        for event in events.iter() {
            match event.severity {
                EventSeverity::Debug => stats.debug_count += 1,
                EventSeverity::Info => stats.info_count += 1,
                EventSeverity::Warning => stats.warning_count += 1,
                EventSeverity::Error => stats.error_count += 1,
                EventSeverity::Critical => stats.critical_count += 1,
            }

            *stats.events_by_type.entry(event.event_name()).or_insert(0) += 1;
        }

        stats
    }
}

impl AuditLogger for InMemoryAuditLogger {
    fn log(&self, event: SecurityEvent) {
        if self.max_events == Some(0) {
            return;
        }

        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);

        // 超出上限时丢弃最旧的事件
        if let Some(max) = self.max_events {
            while events.len() >= max {
                events.pop_front();
            }
        }

        events.push_back(event);
    }
}

/// 审计统计信息
#[derive(Debug, Default, Clone)]
pub struct AuditStats {
    /// 总事件数
    pub total_events: usize,
    /// Debug 级别事件数
    pub debug_count: usize,
    /// Info 级别事件数
    pub info_count: usize,
    /// Warning 级别事件数
    pub warning_count: usize,
    /// Error 级别事件数
    pub error_count: usize,
    /// Critical 级别事件数
    pub critical_count: usize,
    /// 按类型统计
    pub events_by_type: HashMap<String, usize>,
}

// ============================================================================
// TracingAuditLogger
// ============================================================================

/// 将安全事件转发到 `tracing` 的日志记录器
///
/// 严重程度映射到对应的 tracing 级别，事件字段作为结构化字段输出。
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLogger;

impl TracingAuditLogger {
    /// 创建新的 tracing 日志记录器
    pub fn new() -> Self {
        Self
    }
}

impl AuditLogger for TracingAuditLogger {
    fn log(&self, event: SecurityEvent) {
        let event_type = event.event_name();
        let user_id = event.user_id.as_deref().unwrap_or("-");
        let reason = event.details.get("reason").map(String::as_str).unwrap_or("-");
        let message = event.message.as_deref().unwrap_or("");

        match event.severity {
            EventSeverity::Debug => tracing::debug!(
                target: "passport_token::audit",
                event_id = %event.id, %event_type, user_id, reason, "{}", message
            ),
            EventSeverity::Info => tracing::info!(
                target: "passport_token::audit",
                event_id = %event.id, %event_type, user_id, reason, "{}", message
            ),
            EventSeverity::Warning => tracing::warn!(
                target: "passport_token::audit",
                event_id = %event.id, %event_type, user_id, reason, "{}", message
            ),
            EventSeverity::Error | EventSeverity::Critical => tracing::error!(
                target: "passport_token::audit",
                event_id = %event.id, %event_type, user_id, reason, "{}", message
            ),
        }
    }
}

// ============================================================================
// NoOpAuditLogger
// ============================================================================

/// 空操作日志记录器
///
/// 不执行任何操作，[`PassportService`](crate::token::PassportService) 的默认值
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAuditLogger;

impl NoOpAuditLogger {
    /// 创建新的空操作日志记录器
    pub fn new() -> Self {
        Self
    }
}

impl AuditLogger for NoOpAuditLogger {
    fn log(&self, _event: SecurityEvent) {}
}

// ============================================================================
// 测试
// ============================================================================
