//! HTTP surface for the calculator front-end

use actix_web::{dev::Server, get, http::header, web, App, HttpResponse, HttpServer, Responder};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::services::PricingService;

/// Body of every failed pricing response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        let message = err.to_string();
        Self {
            error: if message.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                message
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct CacheHealth {
    source: String,
    fetched_at: DateTime<Utc>,
    age_secs: u64,
    fresh: bool,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    cache: Option<CacheHealth>,
}

#[get("/api/pricing")]
async fn pricing(service: web::Data<PricingService>) -> impl Responder {
    match service.payload().await {
        Ok(lookup) => {
            debug!(status = ?lookup.status, "serving pricing payload");
            HttpResponse::Ok()
                .insert_header((header::CACHE_CONTROL, service.config().cache_control()))
                .json(&*lookup.payload)
        }
        Err(e) => {
            error!(error = %e, "pricing request failed");
            HttpResponse::InternalServerError().json(ErrorBody::from_error(&e))
        }
    }
}

#[get("/healthz")]
async fn healthz(service: web::Data<PricingService>) -> impl Responder {
    let cache = service.cache_snapshot().await.map(|snapshot| CacheHealth {
        source: snapshot.key,
        fetched_at: snapshot.fetched_at,
        age_secs: snapshot.age.as_secs(),
        fresh: snapshot.fresh,
    });

    HttpResponse::Ok().json(Health {
        status: "ok",
        cache,
    })
}

/// Register routes; shared by the server and handler tests
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(pricing).service(healthz);
}

pub fn start_server(service: web::Data<PricingService>, bind: &str) -> std::io::Result<Server> {
    let server = HttpServer::new(move || App::new().app_data(service.clone()).configure(routes))
        .bind(bind)?
        .run();

    info!(bind, "pricing endpoint listening");
    Ok(server)
}
