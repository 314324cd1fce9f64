use crate::{
    api::{absence, leave_request},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Helper to build the per-scope limiter
fn build_limiter(requests_per_min: u32) -> Option<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let leave = web::scope("/leave")
        // /leave
        .service(
            web::resource("")
                .route(web::get().to(leave_request::leave_list))
                .route(web::post().to(leave_request::create_leave)),
        )
        // /leave/{id}
        .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
        // /leave/{id}/approve
        .service(
            web::resource("/{id}/approve").route(web::put().to(leave_request::approve_leave)),
        )
        // /leave/{id}/temporary-approve
        .service(
            web::resource("/{id}/temporary-approve")
                .route(web::put().to(leave_request::temporary_approve_leave)),
        )
        // /leave/{id}/reject
        .service(web::resource("/{id}/reject").route(web::put().to(leave_request::reject_leave)))
        // /leave/{id}/cancel
        .service(web::resource("/{id}/cancel").route(web::put().to(leave_request::cancel_leave)))
        // /leave/{id}/revoke
        .service(web::resource("/{id}/revoke").route(web::put().to(leave_request::revoke_leave)))
        // /leave/{id}/sign
        .service(web::resource("/{id}/sign").route(web::put().to(leave_request::sign_leave)));

    let v1 = web::scope("/v1")
        .service(leave)
        .service(web::resource("/absences").route(web::get().to(absence::absence_overview)));

    // Protected routes
    let protected = web::scope(&config.api_prefix)
        .wrap(from_fn(auth_middleware))
        .service(v1);

    match build_limiter(config.rate_protected_per_min) {
        Some(limiter) => {
            cfg.service(protected.wrap(limiter));
        }
        None => {
            tracing::warn!(
                rate = config.rate_protected_per_min,
                "Invalid rate limit, serving without limiter"
            );
            cfg.service(protected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_builds_for_any_rate() {
        for requests_per_min in [0, 1, 60, 120_000] {
            assert!(build_limiter(requests_per_min).is_some());
        }
    }
}
