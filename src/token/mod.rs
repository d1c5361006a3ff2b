//! Token 模块
//!
//! 提供无状态 Passport Token 的签发与验证。
//!
//! ## 子模块
//!
//! - **passport**: 规范序列化、HMAC 签名、签发/验证函数与 [`PassportService`]
//! - **verdict**: 验证结果 [`Verdict`] 与拒绝原因 [`RejectReason`]
//!
//! ## 按次传入密钥
//!
//! ```rust
//! use passport_token::token::{generate, verify};
//!
//! let token = generate(b"s3cr3t", "alice", 3600).unwrap();
//! assert_eq!(verify(b"s3cr3t", &token).user_id(), Some("alice"));
//! ```
//!
//! ## 固定密钥的服务
//!
//! ```rust
//! use passport_token::token::{PassportService, RejectReason};
//!
//! let service = PassportService::with_secret("s3cr3t").unwrap();
//!
//! let token = service.generate_token("alice", -1).unwrap();
//! assert_eq!(service.verify_token(&token).reason(), Some(RejectReason::Expired));
//! ```

pub mod passport;
pub mod verdict;

pub use passport::{
    HMAC_DOMAIN, IssuedToken, PassportService, TokenClaims, generate, generate_at, verify,
    verify_and_decode, verify_at,
};
pub use verdict::{RejectReason, Verdict};
