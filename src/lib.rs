//! # passport-token
//!
//! 无状态、自包含的认证 Token：绑定一个用户 ID 和过期时间，使用共享密钥
//! 和 HMAC-SHA256 保证完整性。验证时不查询数据库或 Session 存储。
//!
//! ## 功能特性
//!
//! - **URL 安全编码**: Token 可直接放入 URL、Header、Cookie
//! - **HMAC-SHA256 签名**: 带域标签的规范序列化
//! - **常量时间比较**: 防止时序攻击
//! - **结构化验证结果**: 失败原因以数据返回，不抛错
//! - **审计日志**: 签发/验证事件，可转发到 `tracing`
//!
//! ## Token 格式
//!
//! ```text
//! base64url(user) . base64url(issued_at) . base64url(expires_at) . base64(hmac)
//! ```
//!
//! ## 示例
//!
//! ```rust
//! use passport_token::{PassportService, RejectReason, Verdict};
//!
//! let service = PassportService::with_secret("s3cr3t").unwrap();
//!
//! // 签发
//! let token = service.generate_token("alice", 3600).unwrap();
//!
//! // 验证
//! match service.verify_token(&token) {
//!     Verdict::Valid { user_id } => assert_eq!(user_id, "alice"),
//!     Verdict::Invalid(reason) => panic!("rejected: {}", reason),
//! }
//!
//! // 错误的密钥
//! let other = PassportService::with_secret("wrong").unwrap();
//! assert_eq!(
//!     other.verify_token(&token),
//!     Verdict::Invalid(RejectReason::InvalidSignature)
//! );
//! ```

pub mod audit;
pub mod codec;
pub mod config;
pub mod error;
pub mod random;
pub mod token;

pub use error::{Error, Result};

// ============================================================================
// Token 相关导出
// ============================================================================

pub use token::{
    IssuedToken, PassportService, RejectReason, TokenClaims, Verdict, generate, verify,
};

// ============================================================================
// 配置与审计导出
// ============================================================================

pub use audit::{AuditLogger, InMemoryAuditLogger, SecurityEvent, TracingAuditLogger};
pub use config::{PassportConfig, SecretKey};
pub use random::{constant_time_compare, generate_secret_key};
