use crate::{
    api::{self, attendance, employee},
    auth::{
        handlers,
        middleware::{auth_middleware, verify_admin},
    },
    state::AppState,
};
use actix_cors::Cors;
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{guard, middleware::from_fn, web};
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP rate limiters, one per route group.
#[derive(Clone)]
pub struct Limiters {
    token: Arc<Limiter>,
    api: Arc<Limiter>,
}

impl Limiters {
    pub fn from_config(config: &crate::config::Config) -> Result<Self> {
        Ok(Self {
            token: Arc::new(build_limiter(config.rate_token_per_min)?),
            api: Arc::new(build_limiter(config.rate_api_per_min)?),
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {requests_per_min} per minute"))?;
    Ok(Governor::new(&cfg))
}

/// CORS for browser clients. Without configured origins any origin is
/// allowed, credentials are never sent.
pub fn cors(config: &crate::config::Config) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);

    if config.cors_allowed_origins.is_empty() {
        return cors.allow_any_origin().send_wildcard();
    }
    config
        .cors_allowed_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

// Access per route:
//   POST   /jwt                         public
//   GET    /users/admin/{email}         bearer
//   PATCH  /users/{email}               public, or bearer + admin when guarded
//   DELETE /users/{email}               public, or bearer + admin when guarded
//   everything else                     public
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState, limiters: &Limiters) {
    cfg.app_data(web::Data::new(state.config.clone()))
        .app_data(web::Data::new(state.tokens.clone()))
        .app_data(web::Data::new(state.directory.clone()))
        .app_data(web::Data::new(state.ledger.clone()))
        .app_data(web::Data::new(state.guard.clone()));

    cfg.service(api::index);

    cfg.service(
        web::resource("/jwt")
            .wrap(limiters.token.clone())
            .route(web::post().to(handlers::issue_token)),
    );

    cfg.service(
        web::resource("/users/admin/{email}")
            .wrap(from_fn(auth_middleware))
            .wrap(limiters.api.clone())
            .route(web::get().to(handlers::admin_status)),
    );

    cfg.service(
        web::resource("/users")
            .wrap(limiters.api.clone())
            .route(web::post().to(employee::create_user))
            .route(web::get().to(employee::list_users)),
    );

    cfg.service(
        web::resource("/employee/{email}")
            .wrap(limiters.api.clone())
            .route(web::get().to(employee::employee_by_email)),
    );

    // PATCH/DELETE share the path with GET /users/{id}; the method guard
    // lets GET fall through to the next resource.
    let mutations = web::resource("/users/{email}")
        .guard(guard::Any(guard::Patch()).or(guard::Delete()))
        .route(web::patch().to(employee::patch_user))
        .route(web::delete().to(employee::delete_user));
    if state.config.admin_guarded_mutations {
        cfg.service(
            mutations
                .wrap(from_fn(verify_admin))
                .wrap(from_fn(auth_middleware))
                .wrap(limiters.api.clone()),
        );
    } else {
        cfg.service(mutations.wrap(limiters.api.clone()));
    }

    cfg.service(
        web::resource("/users/{id}")
            .wrap(limiters.api.clone())
            .route(web::get().to(employee::get_user)),
    );

    cfg.service(
        web::scope("/attendance")
            .wrap(limiters.api.clone())
            // /attendance
            .service(
                web::resource("")
                    .route(web::post().to(attendance::create_attendance))
                    .route(web::get().to(attendance::list_attendance)),
            )
            // /attendance/{email}
            .service(
                web::resource("/{email}").route(web::get().to(attendance::attendance_by_email)),
            )
            // /attendance/{email}/{date}
            .service(
                web::resource("/{email}/{date}")
                    .route(web::put().to(attendance::update_attendance))
                    .route(web::delete().to(attendance::delete_attendance)),
            ),
    );
}
