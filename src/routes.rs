use crate::{
    api::{absence, access, employee, punch, timeclock},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            (60_000 / requests_per_min as u64).max(1)
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min.max(1))
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("limiter period and burst are non-zero");
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            // authenticated, but must stay reachable while locked
            .service(
                web::resource("/unlock")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::unlock)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .route("/me", web::get().to(handlers::me))
            .route("/activity", web::post().to(handlers::report_activity))
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::get().to(employee::list_employees))
                            .route(web::post().to(employee::create_employee)),
                    )
                    .service(web::resource("/{id}/status").route(web::put().to(employee::toggle_status)))
                    .service(
                        web::resource("/{id}/biometric").route(web::put().to(employee::register_biometric)),
                    ),
            )
            .service(
                web::resource("/punches")
                    .route(web::get().to(punch::list_punches))
                    .route(web::post().to(punch::register_punch)),
            )
            .service(
                web::scope("/absences")
                    .service(
                        web::resource("")
                            .route(web::get().to(absence::list_absences))
                            .route(web::post().to(absence::create_absence)),
                    )
                    .service(web::resource("/{id}/status").route(web::put().to(absence::decide_absence))),
            )
            .service(
                web::scope("/vacations")
                    .service(web::resource("").route(web::get().to(absence::list_vacations)))
                    .service(web::resource("/{id}/status").route(web::put().to(absence::decide_vacation))),
            )
            .service(
                web::resource("/access")
                    .route(web::get().to(access::get_access))
                    .route(web::put().to(access::save_access)),
            )
            .service(
                web::scope("/timeclock/sessions")
                    // /timeclock/sessions
                    .service(web::resource("").route(web::post().to(timeclock::open_session)))
                    // /timeclock/sessions/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(timeclock::get_session))
                            .route(web::delete().to(timeclock::close_session)),
                    )
                    .service(web::resource("/{id}/direction").route(web::post().to(timeclock::select_direction)))
                    .service(web::resource("/{id}/employees").route(web::get().to(timeclock::roster)))
                    .service(web::resource("/{id}/employee").route(web::post().to(timeclock::select_employee)))
                    .service(web::resource("/{id}/confirm").route(web::post().to(timeclock::confirm)))
                    .service(web::resource("/{id}/cancel").route(web::post().to(timeclock::cancel))),
            ),
    );
}
