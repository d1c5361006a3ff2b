//! Passport Token 引擎
//!
//! 无状态的 HMAC-SHA256 签名 Token，绑定用户 ID 与过期时间。验证时不查询
//! 任何存储，所有信任都来自签名密钥。
//!
//! ## Token 格式
//!
//! Token 由四部分组成，使用 `.` 分隔：
//! - 用户 ID（URL 安全 Base64，无填充）
//! - 签发时间，十进制 Unix 秒（URL 安全 Base64，无填充）
//! - 过期时间，十进制 Unix 秒（URL 安全 Base64，无填充）
//! - HMAC-SHA256 签名（标准 Base64，带填充）
//!
//! 签名输入为规范序列化 `PassportTokenAuth/v1|用户段|签发段|过期段`，
//! 其中各段均为 **接收到的编码形式**。
//!
//! ## 示例
//!
//! ```rust
//! use passport_token::token::passport::{generate, verify};
//! use passport_token::token::{RejectReason, Verdict};
//!
//! let token = generate(b"s3cr3t", "alice", 3600).unwrap();
//! assert_eq!(token.matches('.').count(), 3);
//!
//! assert_eq!(
//!     verify(b"s3cr3t", &token),
//!     Verdict::Valid { user_id: "alice".to_string() }
//! );
//! assert_eq!(
//!     verify(b"wrong", &token),
//!     Verdict::Invalid(RejectReason::InvalidSignature)
//! );
//! ```

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::audit::{AuditLogger, NoOpAuditLogger, SecurityEvent};
use crate::codec;
use crate::config::PassportConfig;
use crate::error::{CryptoError, Error, Result, TokenError, ValidationError};
use crate::random::constant_time_compare_str;
use crate::token::verdict::{RejectReason, Verdict};

type HmacSha256 = Hmac<Sha256>;

/// 签名域标签，修改它会使所有已签发的 Token 失效
pub const HMAC_DOMAIN: &str = "PassportTokenAuth/v1";

/// 规范序列化的内部分隔符
pub const INTERNAL_SEP: &str = "|";

/// Token 段分隔符
pub const TOKEN_SEP: &str = ".";

/// 当前 Unix 时间（秒）
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// 构建规范序列化，即 HMAC 的输入
///
/// # Example
///
/// ```rust
/// use passport_token::token::passport::serialize;
///
/// assert_eq!(serialize("dQ", "MQ", "Mg"), "PassportTokenAuth/v1|dQ|MQ|Mg");
/// ```
pub fn serialize(user_part: &str, iat_part: &str, exp_part: &str) -> String {
    [HMAC_DOMAIN, user_part, iat_part, exp_part].join(INTERNAL_SEP)
}

/// 使用完整密钥计算 HMAC-SHA256，返回标准 Base64（带填充）
pub fn compute_hmac(secret: &[u8], payload: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| Error::internal(format!("HMAC 初始化失败: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(codec::encode_signature(&mac.finalize().into_bytes()))
}

/// 签发 Token（使用当前时间）
///
/// # 参数
///
/// * `secret` - 签名密钥
/// * `user_id` - 用户 ID，不能为空
/// * `ttl` - 有效期（秒），可以为 0 或负数以生成已过期的 Token
pub fn generate(secret: &[u8], user_id: &str, ttl: i64) -> Result<String> {
    generate_at(secret, user_id, ttl, now())
}

/// 以指定的签发时间签发 Token
pub fn generate_at(secret: &[u8], user_id: &str, ttl: i64, issued_at: i64) -> Result<String> {
    Ok(issue_at(secret, user_id, ttl, issued_at)?.token)
}

fn issue_at(secret: &[u8], user_id: &str, ttl: i64, issued_at: i64) -> Result<IssuedToken> {
    if secret.is_empty() {
        return Err(CryptoError::InvalidKey("签名密钥不能为空".to_string()).into());
    }
    if user_id.is_empty() {
        return Err(ValidationError::EmptyField("user_id".to_string()).into());
    }

    let expires_at = issued_at
        .checked_add(ttl)
        .ok_or_else(|| TokenError::InvalidClaim(format!("过期时间溢出: {} + {}", issued_at, ttl)))?;

    let user_part = codec::encode(user_id);
    let iat_part = codec::encode(issued_at.to_string());
    let exp_part = codec::encode(expires_at.to_string());

    let signature = compute_hmac(secret, &serialize(&user_part, &iat_part, &exp_part))?;

    Ok(IssuedToken {
        token: [user_part, iat_part, exp_part, signature].join(TOKEN_SEP),
        claims: TokenClaims {
            user_id: user_id.to_string(),
            issued_at,
            expires_at,
        },
    })
}

/// 验证 Token（使用当前时间）
///
/// 纯函数：不抛错、不 panic，所有失败都以 [`Verdict::Invalid`] 返回。
pub fn verify(secret: &[u8], token: &str) -> Verdict {
    verify_at(secret, token, now())
}

/// 以指定的当前时间验证 Token
pub fn verify_at(secret: &[u8], token: &str, now: i64) -> Verdict {
    match check(secret, token, now) {
        Ok(claims) => Verdict::Valid {
            user_id: claims.user_id,
        },
        Err(reason) => Verdict::Invalid(reason),
    }
}

/// 验证 Token 并返回完整的 claims
///
/// # Errors
///
/// 每种拒绝原因映射到对应的 [`TokenError`]
pub fn verify_and_decode(secret: &[u8], token: &str) -> Result<TokenClaims> {
    verify_and_decode_at(secret, token, now())
}

/// 以指定的当前时间验证 Token 并返回完整的 claims
pub fn verify_and_decode_at(secret: &[u8], token: &str, now: i64) -> Result<TokenClaims> {
    check(secret, token, now).map_err(|reason| Error::Token(reason.into()))
}

/// 验证状态机：格式 → 重算签名 → 常量时间比较 → 过期检查 → 接受
fn check(secret: &[u8], token: &str, now: i64) -> std::result::Result<TokenClaims, RejectReason> {
    let parts: Vec<&str> = token.split(TOKEN_SEP).collect();
    let [user_part, iat_part, exp_part, sig_part] = &parts[..] else {
        return Err(RejectReason::InvalidFormat);
    };
    if parts.iter().any(|p| p.is_empty()) {
        return Err(RejectReason::InvalidFormat);
    }

    // 签名必须基于接收到的编码段计算，解码只发生在签名校验之后
    let expected = compute_hmac(secret, &serialize(user_part, iat_part, exp_part))
        .map_err(|_| RejectReason::InvalidSignature)?;
    if !constant_time_compare_str(&expected, sig_part) {
        return Err(RejectReason::InvalidSignature);
    }

    let expires_at = codec::decode(exp_part)
        .ok()
        .and_then(|text| parse_timestamp(&text))
        .ok_or(RejectReason::MalformedExpiry)?;
    if expires_at < now {
        return Err(RejectReason::Expired);
    }

    let user_id = codec::decode(user_part).map_err(|_| RejectReason::InvalidFormat)?;
    let issued_at = codec::decode(iat_part)
        .ok()
        .and_then(|text| parse_timestamp(&text))
        .ok_or(RejectReason::InvalidFormat)?;

    Ok(TokenClaims {
        user_id,
        issued_at,
        expires_at,
    })
}

/// 解析十进制时间戳
///
/// 整数直接解析；其它有限数值（如 `1.7e9`）向下取整。NaN、无穷大
/// 和非数字文本返回 `None`。
fn parse_timestamp(text: &str) -> Option<i64> {
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.floor() as i64)
}

/// 已验证 Token 的内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// 用户 ID
    pub user_id: String,
    /// 签发时间（Unix 秒）
    pub issued_at: i64,
    /// 过期时间（Unix 秒）
    pub expires_at: i64,
}

impl TokenClaims {
    /// 检查是否已过期
    pub fn is_expired(&self) -> bool {
        self.expires_at < now()
    }

    /// 获取剩余有效时间（秒），已过期时返回 `None`
    pub fn remaining_ttl(&self) -> Option<i64> {
        let remaining = self.expires_at - now();
        (remaining >= 0).then_some(remaining)
    }
}

/// 签发结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// 完整的 Token 字符串
    pub token: String,
    /// Token 内容
    pub claims: TokenClaims,
}

/// Passport Token 服务
///
/// 构造时固定签名密钥，之后只读；克隆开销很小，可在多个线程间共享。
/// 每次签发和验证都会写入审计日志（默认不记录）。
///
/// # 示例
///
/// ```rust
/// use passport_token::config::PassportConfig;
/// use passport_token::token::PassportService;
///
/// let service = PassportService::new(PassportConfig::new("s3cr3t").unwrap());
///
/// let token = service.generate_token("alice", 3600).unwrap();
/// let verdict = service.verify_token(&token);
/// assert_eq!(verdict.user_id(), Some("alice"));
/// ```
#[derive(Clone)]
pub struct PassportService {
    config: PassportConfig,
    audit: Arc<dyn AuditLogger>,
}

impl std::fmt::Debug for PassportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassportService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PassportService {
    /// 创建新的 Token 服务
    pub fn new(config: PassportConfig) -> Self {
        Self {
            config,
            audit: Arc::new(NoOpAuditLogger),
        }
    }

    /// 从环境变量 `PASSPORT_SECRET_KEY` 创建
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(PassportConfig::from_env()?))
    }

    /// 使用指定密钥创建
    pub fn with_secret(secret: impl AsRef<[u8]>) -> Result<Self> {
        Ok(Self::new(PassportConfig::new(secret)?))
    }

    /// 设置审计日志记录器
    pub fn with_audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit = logger;
        self
    }

    /// 获取配置
    pub fn config(&self) -> &PassportConfig {
        &self.config
    }

    fn secret(&self) -> &[u8] {
        self.config.secret().as_bytes()
    }

    /// 签发 Token
    ///
    /// # 参数
    ///
    /// * `user_id` - 用户 ID
    /// * `ttl` - 有效期（秒）
    pub fn generate_token(&self, user_id: &str, ttl: i64) -> Result<String> {
        Ok(self.issue_token(user_id, ttl)?.token)
    }

    /// 签发 Token 并返回其内容
    pub fn issue_token(&self, user_id: &str, ttl: i64) -> Result<IssuedToken> {
        let issued = issue_at(self.secret(), user_id, ttl, now())?;

        tracing::debug!(
            user_id,
            issued_at = issued.claims.issued_at,
            expires_at = issued.claims.expires_at,
            "token issued"
        );
        self.audit
            .log(SecurityEvent::token_issued(user_id, issued.claims.expires_at));

        Ok(issued)
    }

    /// 验证 Token
    pub fn verify_token(&self, token: &str) -> Verdict {
        let verdict = verify(self.secret(), token);
        self.record(verdict.user_id(), verdict.reason());
        verdict
    }

    /// 验证 Token 并返回完整的 claims
    pub fn verify_and_decode(&self, token: &str) -> Result<TokenClaims> {
        match check(self.secret(), token, now()) {
            Ok(claims) => {
                self.record(Some(&claims.user_id), None);
                Ok(claims)
            }
            Err(reason) => {
                self.record(None, Some(reason));
                Err(Error::Token(reason.into()))
            }
        }
    }

    fn record(&self, user_id: Option<&str>, reason: Option<RejectReason>) {
        match (user_id, reason) {
            (_, Some(reason)) => {
                tracing::debug!(reason = reason.as_str(), "token rejected");
                self.audit.log(SecurityEvent::token_rejected(reason));
            }
            (Some(user_id), None) => {
                tracing::debug!(user_id, "token verified");
                self.audit.log(SecurityEvent::token_verified(user_id));
            }
            (None, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{EventType, InMemoryAuditLogger};

    const SECRET: &[u8] = b"test-secret-key-must-be-32-bytes!";
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_serialize_layout() {
        assert_eq!(
            serialize("YWxpY2U", "MTcwMDAwMDAwMA", "MTcwMDAwMzYwMA"),
            "PassportTokenAuth/v1|YWxpY2U|MTcwMDAwMDAwMA|MTcwMDAwMzYwMA"
        );
    }

    #[test]
    fn test_compute_hmac_is_padded_base64() {
        let sig = compute_hmac(SECRET, "payload").unwrap();
        assert_eq!(sig.len(), 44);
        assert!(sig.ends_with('='));
        assert_eq!(sig, compute_hmac(SECRET, "payload").unwrap());
        assert_ne!(sig, compute_hmac(b"other", "payload").unwrap());
    }

    #[test]
    fn test_generate_at_layout() {
        let token = generate_at(SECRET, "alice", 3600, NOW).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "YWxpY2U");
        assert_eq!(parts[1], "MTcwMDAwMDAwMA");
        assert_eq!(parts[2], "MTcwMDAwMzYwMA");
        assert_eq!(
            parts[3],
            compute_hmac(SECRET, &serialize(parts[0], parts[1], parts[2])).unwrap()
        );
    }

    #[test]
    fn test_generate_is_deterministic_for_same_second() {
        let a = generate_at(SECRET, "alice", 60, NOW).unwrap();
        let b = generate_at(SECRET, "alice", 60, NOW).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_rejects_empty_inputs() {
        assert!(matches!(
            generate_at(SECRET, "", 60, NOW),
            Err(Error::Validation(ValidationError::EmptyField(_)))
        ));
        assert!(matches!(
            generate_at(b"", "alice", 60, NOW),
            Err(Error::Crypto(CryptoError::InvalidKey(_)))
        ));
    }

    #[test]
    fn test_generate_rejects_overflow() {
        let err = generate_at(SECRET, "alice", i64::MAX, NOW).unwrap_err();
        assert!(matches!(
            err.as_token_error(),
            Some(TokenError::InvalidClaim(_))
        ));
    }

    #[test]
    fn test_verify_at_valid() {
        let token = generate_at(SECRET, "alice", 3600, NOW).unwrap();
        assert_eq!(
            verify_at(SECRET, &token, NOW),
            Verdict::Valid {
                user_id: "alice".to_string()
            }
        );
    }

    #[test]
    fn test_verify_at_expiry_boundary() {
        let token = generate_at(SECRET, "alice", 0, NOW).unwrap();

        assert!(verify_at(SECRET, &token, NOW).is_valid());
        assert_eq!(
            verify_at(SECRET, &token, NOW + 1),
            Verdict::Invalid(RejectReason::Expired)
        );
    }

    #[test]
    fn test_verify_negative_ttl_is_expired() {
        let token = generate_at(SECRET, "alice", -1, NOW).unwrap();
        assert_eq!(
            verify_at(SECRET, &token, NOW),
            Verdict::Invalid(RejectReason::Expired)
        );
    }

    #[test]
    fn test_verify_wrong_secret() {
        let token = generate_at(SECRET, "alice", 3600, NOW).unwrap();
        assert_eq!(
            verify_at(b"another-secret", &token, NOW),
            Verdict::Invalid(RejectReason::InvalidSignature)
        );
    }

    #[test]
    fn test_verify_rejects_wrong_segment_count() {
        for token in ["", "a", "a.b", "a.b.c", "a.b.c.d.e", "...."] {
            assert_eq!(
                verify_at(SECRET, token, NOW),
                Verdict::Invalid(RejectReason::InvalidFormat),
                "token {:?}",
                token
            );
        }
    }

    #[test]
    fn test_verify_rejects_empty_segment() {
        let token = generate_at(SECRET, "alice", 3600, NOW).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let emptied = format!("{}..{}.{}", parts[0], parts[2], parts[3]);

        assert_eq!(
            verify_at(SECRET, &emptied, NOW),
            Verdict::Invalid(RejectReason::InvalidFormat)
        );
    }

    #[test]
    fn test_verify_swapped_timestamps_fail_signature() {
        let token = generate_at(SECRET, "alice", 3600, NOW).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let swapped = format!("{}.{}.{}.{}", parts[0], parts[2], parts[1], parts[3]);

        assert_eq!(
            verify_at(SECRET, &swapped, NOW),
            Verdict::Invalid(RejectReason::InvalidSignature)
        );
    }

    /// 用合法签名构造任意内容的 Token，模拟密钥持有者签出的异常数据
    fn signed(user_part: &str, iat_part: &str, exp_part: &str) -> String {
        let sig = compute_hmac(SECRET, &serialize(user_part, iat_part, exp_part)).unwrap();
        format!("{}.{}.{}.{}", user_part, iat_part, exp_part, sig)
    }

    #[test]
    fn test_verify_malformed_expiry() {
        let user = codec::encode("alice");
        let iat = codec::encode(NOW.to_string());

        for exp in ["soon", "NaN", "inf", ""] {
            let token = signed(&user, &iat, &codec::encode(exp));
            let expected = if exp.is_empty() {
                // 空字符串编码后为空段
                RejectReason::InvalidFormat
            } else {
                RejectReason::MalformedExpiry
            };
            assert_eq!(verify_at(SECRET, &token, NOW), Verdict::Invalid(expected));
        }

        // 过期段本身不是合法 Base64
        let token = signed(&user, &iat, "abcde");
        assert_eq!(
            verify_at(SECRET, &token, NOW),
            Verdict::Invalid(RejectReason::MalformedExpiry)
        );
    }

    #[test]
    fn test_verify_accepts_fractional_expiry() {
        let token = signed(
            &codec::encode("alice"),
            &codec::encode(NOW.to_string()),
            &codec::encode("1.7000036e9"),
        );
        assert!(verify_at(SECRET, &token, NOW).is_valid());
    }

    #[test]
    fn test_verify_undecodable_user_is_invalid_format() {
        let token = signed(
            "abcde",
            &codec::encode(NOW.to_string()),
            &codec::encode((NOW + 60).to_string()),
        );
        assert_eq!(
            verify_at(SECRET, &token, NOW),
            Verdict::Invalid(RejectReason::InvalidFormat)
        );
    }

    #[test]
    fn test_verify_non_numeric_issued_at_is_invalid_format() {
        let token = signed(
            &codec::encode("alice"),
            &codec::encode("not-a-number"),
            &codec::encode((NOW + 3600).to_string()),
        );
        assert_eq!(
            verify_at(SECRET, &token, NOW),
            Verdict::Invalid(RejectReason::InvalidFormat)
        );

        let err = verify_and_decode_at(SECRET, &token, NOW).unwrap_err();
        assert!(matches!(
            err.as_token_error(),
            Some(TokenError::InvalidFormat(_))
        ));

        // 签发段本身不是合法 Base64
        let token = signed(
            &codec::encode("alice"),
            "abcde",
            &codec::encode((NOW + 3600).to_string()),
        );
        assert_eq!(
            verify_at(SECRET, &token, NOW),
            Verdict::Invalid(RejectReason::InvalidFormat)
        );
    }

    #[test]
    fn test_generate_at_known_answer() {
        let token = generate_at(b"s3cr3t", "alice", 3600, NOW).unwrap();
        assert_eq!(
            token,
            "YWxpY2U.MTcwMDAwMDAwMA.MTcwMDAwMzYwMA.GVdtr+qfqjNwHEWP/EpN/jl0JWr3+w1CHEi8O40+/z4="
        );
    }

    #[test]
    fn test_verify_and_decode_at() {
        let token = generate_at(SECRET, "alice", 3600, NOW).unwrap();
        let claims = verify_and_decode_at(SECRET, &token, NOW).unwrap();

        assert_eq!(claims.user_id, "alice");
        assert_eq!(claims.issued_at, NOW);
        assert_eq!(claims.expires_at, NOW + 3600);

        let err = verify_and_decode_at(SECRET, &token, NOW + 3601).unwrap_err();
        assert_eq!(err.as_token_error(), Some(&TokenError::Expired));
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1700000000"), Some(1_700_000_000));
        assert_eq!(parse_timestamp("-5"), Some(-5));
        assert_eq!(parse_timestamp("12.9"), Some(12));
        assert_eq!(parse_timestamp("NaN"), None);
        assert_eq!(parse_timestamp("infinity"), None);
        assert_eq!(parse_timestamp("abc"), None);
    }

    #[test]
    fn test_claims_helpers() {
        let live = TokenClaims {
            user_id: "alice".to_string(),
            issued_at: now(),
            expires_at: now() + 60,
        };
        assert!(!live.is_expired());
        assert!(live.remaining_ttl().unwrap() <= 60);

        let dead = TokenClaims {
            expires_at: now() - 10,
            ..live
        };
        assert!(dead.is_expired());
        assert_eq!(dead.remaining_ttl(), None);
    }

    #[test]
    fn test_service_records_audit_events() {
        let logger = InMemoryAuditLogger::new();
        let service = PassportService::with_secret(SECRET)
            .unwrap()
            .with_audit_logger(Arc::new(logger.clone()));

        let token = service.generate_token("alice", 3600).unwrap();
        assert!(service.verify_token(&token).is_valid());
        assert!(!service.verify_token("garbage").is_valid());

        assert_eq!(logger.get_events_by_type(&EventType::TokenIssued).len(), 1);
        assert_eq!(logger.get_events_by_type(&EventType::TokenVerified).len(), 1);
        assert_eq!(logger.get_events_by_type(&EventType::TokenRejected).len(), 1);
    }

    #[test]
    fn test_service_audit_never_contains_secret_or_signature() {
        let logger = InMemoryAuditLogger::new();
        let service = PassportService::with_secret(SECRET)
            .unwrap()
            .with_audit_logger(Arc::new(logger.clone()));

        let token = service.generate_token("alice", 3600).unwrap();
        service.verify_token(&token);
        let signature = token.rsplit('.').next().unwrap();

        let dump = serde_json::to_string(&logger.get_events()).unwrap();
        assert!(!dump.contains(signature));
        assert!(!dump.contains(std::str::from_utf8(SECRET).unwrap()));
    }

    #[test]
    fn test_service_debug_hides_secret() {
        let service = PassportService::with_secret("top-secret").unwrap();
        assert!(!format!("{:?}", service).contains("top-secret"));
    }

    #[test]
    fn test_service_issue_token_claims() {
        let service = PassportService::with_secret(SECRET).unwrap();
        let issued = service.issue_token("bob", 120).unwrap();

        assert_eq!(issued.claims.expires_at - issued.claims.issued_at, 120);
        let claims = service.verify_and_decode(&issued.token).unwrap();
        assert_eq!(claims, issued.claims);
    }
}
