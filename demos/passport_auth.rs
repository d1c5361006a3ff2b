//! Passport Token 认证示例
//!
//! 展示如何签发、验证 Passport Token，以及各种拒绝原因。
//!
//! 运行: PASSPORT_SECRET_KEY=... cargo run --example passport_auth
//! （未设置时会临时生成一个密钥）

use std::sync::Arc;

use passport_token::audit::InMemoryAuditLogger;
use passport_token::token::{PassportService, Verdict};
use passport_token::{PassportConfig, TracingAuditLogger, generate_secret_key};

/// 模拟的用户服务
struct UserService;

impl UserService {
    fn authenticate(username: &str, password: &str) -> Option<String> {
        // 实际应用中应查询数据库并验证密码
        (username == "alice" && password == "password123").then(|| "user_001".to_string())
    }
}

fn load_config() -> PassportConfig {
    match PassportConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("⚠️  {}，使用临时生成的密钥\n", e);
            let secret = generate_secret_key().expect("随机数生成失败");
            PassportConfig::new(secret).expect("生成的密钥不为空")
        }
    }
}

fn describe(verdict: &Verdict) {
    match verdict {
        Verdict::Valid { user_id } => println!("   ✅ Token 有效，用户: {}\n", user_id),
        Verdict::Invalid(reason) => println!("   ❌ {}\n", reason),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("passport_token=info")
        .init();

    println!("=== Passport Token 认证示例 ===\n");

    let memory = InMemoryAuditLogger::new();
    let service = PassportService::new(load_config())
        .with_audit_logger(Arc::new(TracingAuditLogger::new()));
    let audited = service.clone().with_audit_logger(Arc::new(memory.clone()));

    // 1. 登录并签发 Token
    println!("🔐 用户登录...");
    let Some(user_id) = UserService::authenticate("alice", "password123") else {
        println!("   ❌ 用户名或密码错误");
        return;
    };
    let issued = service.issue_token(&user_id, 3600).expect("签发失败");
    println!("   Token: {}", issued.token);
    println!("   过期时间: {}\n", issued.claims.expires_at);

    // 2. 验证 Token
    println!("🔍 验证 Token...");
    describe(&service.verify_token(&issued.token));

    // 3. 篡改用户段
    println!("🔍 验证被篡改的 Token...");
    let forged = passport_token::codec::encode("admin");
    let mut parts: Vec<&str> = issued.token.split('.').collect();
    parts[0] = &forged;
    describe(&service.verify_token(&parts.join(".")));

    // 4. 格式错误
    println!("🔍 验证格式错误的 Token...");
    describe(&service.verify_token("invalid.token.here"));

    // 5. 已过期
    println!("🔍 验证已过期的 Token...");
    let expired = service.generate_token(&user_id, -1).expect("签发失败");
    describe(&audited.verify_token(&expired));

    // 6. 序列化验证结果，交给 HTTP 层返回
    println!("📦 验证结果 JSON:");
    let verdict = audited.verify_token(&issued.token);
    println!("   {}\n", serde_json::to_string(&verdict).expect("序列化失败"));

    println!("📊 审计事件: {}", memory.event_count());
    println!("\n=== 示例结束 ===");
}
