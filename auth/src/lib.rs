use common::env_config::JwtConfig;
use middleware::{extractor::SessionMiddleware, guard::MemberGuard};

pub mod middleware {
    pub mod extractor;
    pub mod guard;
}

/// Decodes the bearer access token, if any, into request extensions.
pub fn session_middleware(jwt_config: JwtConfig) -> SessionMiddleware {
    SessionMiddleware::new(jwt_config)
}

/// Rejects requests that do not carry a valid member session.
pub fn member_middleware() -> MemberGuard {
    MemberGuard::new()
}
