//! 统一错误类型模块
//!
//! 提供 passport-token 库中所有操作的错误类型定义。
//!
//! 注意：Token 验证失败（格式错误、签名不匹配、过期）不是错误，
//! 而是以 [`Verdict`](crate::token::Verdict) 的形式返回。这里的错误只覆盖
//! 签发参数校验、配置加载和密钥初始化等操作性失败。

use std::fmt;

/// passport-token 库的统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// passport-token 库的错误类型
#[derive(Debug)]
pub enum Error {
    /// Token 相关错误
    Token(TokenError),

    /// 验证错误
    Validation(ValidationError),

    /// 配置错误
    Config(ConfigError),

    /// 加密错误
    Crypto(CryptoError),

    /// 内部错误
    Internal(String),
}

impl Error {
    /// 创建一个内部错误
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// 创建一个验证错误
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(ValidationError::Custom(msg.into()))
    }

    /// 如果是 Token 错误，返回其引用
    pub fn as_token_error(&self) -> Option<&TokenError> {
        match self {
            Error::Token(e) => Some(e),
            _ => None,
        }
    }
}

/// Token 相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token 已过期
    Expired,
    /// Token 格式无效
    InvalidFormat(String),
    /// Token 签名无效
    InvalidSignature,
    /// 过期时间无法解析为有限数值
    MalformedExpiry,
    /// Token 解码失败
    DecodingFailed(String),
    /// 无效的 claim 值
    InvalidClaim(String),
}

/// 验证相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 字段为空
    EmptyField(String),
    /// 自定义验证错误
    Custom(String),
}

/// 配置相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 缺少必需的配置
    MissingRequired(String),
    /// 无效的配置值
    InvalidValue { key: String, message: String },
}

/// 加密相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// 随机数生成失败
    RngFailed(String),
    /// 密钥无效
    InvalidKey(String),
}

// ============================================================================
// Display 实现
// ============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Token(e) => write!(f, "Token error: {}", e),
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::Config(e) => write!(f, "Config error: {}", e),
            Error::Crypto(e) => write!(f, "Crypto error: {}", e),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Expired => write!(f, "token has expired"),
            TokenError::InvalidFormat(msg) => write!(f, "invalid token format: {}", msg),
            TokenError::InvalidSignature => write!(f, "invalid token signature"),
            TokenError::MalformedExpiry => write!(f, "malformed token expiry"),
            TokenError::DecodingFailed(msg) => write!(f, "token decoding failed: {}", msg),
            TokenError::InvalidClaim(msg) => write!(f, "invalid claim value: {}", msg),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "field '{}' cannot be empty", field),
            ValidationError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(key) => {
                write!(f, "missing required configuration: {}", key)
            }
            ConfigError::InvalidValue { key, message } => {
                write!(f, "invalid configuration value for '{}': {}", key, message)
            }
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::RngFailed(msg) => write!(f, "random number generation failed: {}", msg),
            CryptoError::InvalidKey(msg) => write!(f, "invalid key: {}", msg),
        }
    }
}

// ============================================================================
// std::error::Error 实现
// ============================================================================

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Token(e) => Some(e),
            Error::Validation(e) => Some(e),
            Error::Config(e) => Some(e),
            Error::Crypto(e) => Some(e),
            Error::Internal(_) => None,
        }
    }
}

impl std::error::Error for TokenError {}
impl std::error::Error for ValidationError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for CryptoError {}

// ============================================================================
// From 实现 - 方便错误转换
// ============================================================================

impl From<TokenError> for Error {
    fn from(err: TokenError) -> Self {
        Error::Token(err)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        Error::Crypto(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = Error::Token(TokenError::InvalidSignature);
        assert_eq!(err.to_string(), "Token error: invalid token signature");
    }

    #[test]
    fn test_error_from_token_error() {
        let err: Error = TokenError::Expired.into();
        assert!(matches!(err, Error::Token(TokenError::Expired)));
        assert_eq!(err.as_token_error(), Some(&TokenError::Expired));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired("PASSPORT_SECRET_KEY".to_string());
        assert_eq!(
            err.to_string(),
            "missing required configuration: PASSPORT_SECRET_KEY"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("user_id".to_string());
        assert_eq!(err.to_string(), "field 'user_id' cannot be empty");
    }

    #[test]
    fn test_error_source() {
        let err: Error = CryptoError::InvalidKey("empty".to_string()).into();
        assert!(err.source().is_some());
        assert!(Error::internal("boom").source().is_none());
    }
}
