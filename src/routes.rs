use crate::{api::handover, auth::middleware::auth_middleware};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

pub type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter shared by all workers; build once before starting the server.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<LimiterConfig> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("invalid rate limit: {requests_per_min} per minute"))
}

/// Protected API: per-IP rate limiting in front of JWT authentication.
pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiter: &LimiterConfig) {
    cfg.service(
        web::scope(api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(Governor::new(limiter))
            .configure(handover::configure),
    );
}

// API REQUEST
//  └─ Authorization: Bearer access_token (issued by the identity service)
//       └─ auth_middleware → AuthUser in request extensions
//            └─ handover handlers → HandoverCoordinator
