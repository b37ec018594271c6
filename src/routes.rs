use crate::{config::Config, coordinator::handlers};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    // Protected routes; session verification happens in the AuthUser
    // extractor on each handler
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(build_limiter(config.rate_protected_per_min))
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(handlers::list_leaves))
                            .route(web::post().to(handlers::apply_leave)),
                    )
                    // /leave/own
                    .service(web::resource("/own").route(web::get().to(handlers::own_leaves)))
                    // /leave/status/{status}
                    .service(
                        web::resource("/status/{status}")
                            .route(web::get().to(handlers::pending_by_status)),
                    )
                    // /leave/employee/{email}
                    .service(
                        web::resource("/employee/{email}")
                            .route(web::get().to(handlers::pending_by_email)),
                    )
                    // /leave/approve, target of issued capability links
                    .service(
                        web::resource("/approve").route(web::patch().to(handlers::approve_leave)),
                    )
                    // /leave/reject, target of issued capability links
                    .service(
                        web::resource("/reject").route(web::patch().to(handlers::reject_leave)),
                    ),
            )
            .service(
                web::scope("/employee")
                    // /employee/me
                    .service(web::resource("/me").route(web::get().to(handlers::own_details))),
            ),
    );
}
