//! 验证结果
//!
//! 验证失败被建模为数据而不是错误：调用方（HTTP 中间件等）根据
//! [`Verdict`] 决定如何响应。

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::TokenError;

/// Token 被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RejectReason {
    /// Token 不是恰好四个非空的 `.` 分隔段
    InvalidFormat,
    /// 签名不匹配（篡改与错误密钥不可区分）
    InvalidSignature,
    /// 签名有效，但过期时间早于当前时间
    Expired,
    /// 过期时间段无法解码为有限数值
    MalformedExpiry,
}

impl RejectReason {
    /// 稳定的小写标识，用于日志和审计详情
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InvalidFormat => "invalid_format",
            RejectReason::InvalidSignature => "invalid_signature",
            RejectReason::Expired => "expired",
            RejectReason::MalformedExpiry => "malformed_expiry",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidFormat => write!(f, "invalid token format"),
            RejectReason::InvalidSignature => write!(f, "invalid token signature"),
            RejectReason::Expired => write!(f, "token has expired"),
            RejectReason::MalformedExpiry => write!(f, "malformed token expiry"),
        }
    }
}

impl From<RejectReason> for TokenError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::InvalidFormat => {
                TokenError::InvalidFormat("malformed token segments".to_string())
            }
            RejectReason::InvalidSignature => TokenError::InvalidSignature,
            RejectReason::Expired => TokenError::Expired,
            RejectReason::MalformedExpiry => TokenError::MalformedExpiry,
        }
    }
}

/// Token 验证结果
///
/// 序列化为 `{"valid":true,"userId":"..."}` 或
/// `{"valid":false,"reason":"InvalidSignature"}`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Token 有效，携带已认证的用户 ID
    Valid {
        /// 已认证的用户 ID
        user_id: String,
    },
    /// Token 无效
    Invalid(RejectReason),
}

impl Verdict {
    /// 是否通过验证
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid { .. })
    }

    /// 已认证的用户 ID
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Verdict::Valid { user_id } => Some(user_id),
            Verdict::Invalid(_) => None,
        }
    }

    /// 拒绝原因
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Verdict::Valid { .. } => None,
            Verdict::Invalid(reason) => Some(*reason),
        }
    }

    /// 转换为 `Result`，便于在返回 `Result` 的调用链中使用 `?`
    ///
    /// # Example
    ///
    /// ```rust
    /// use passport_token::error::TokenError;
    /// use passport_token::token::{RejectReason, Verdict};
    ///
    /// let verdict = Verdict::Invalid(RejectReason::Expired);
    /// assert_eq!(verdict.into_result(), Err(TokenError::Expired));
    /// ```
    pub fn into_result(self) -> std::result::Result<String, TokenError> {
        match self {
            Verdict::Valid { user_id } => Ok(user_id),
            Verdict::Invalid(reason) => Err(reason.into()),
        }
    }
}

impl Serialize for Verdict {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Verdict", 2)?;
        match self {
            Verdict::Valid { user_id } => {
                state.serialize_field("valid", &true)?;
                state.serialize_field("userId", user_id)?;
            }
            Verdict::Invalid(reason) => {
                state.serialize_field("valid", &false)?;
                state.serialize_field("reason", reason)?;
            }
        }
        state.end()
    }
}
