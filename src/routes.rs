use crate::{
    api::{attendance, device, employee, sync},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let api_limiter = Arc::new(build_limiter(config.rate_api_per_min));
    let upload_limiter = Arc::new(build_limiter(config.rate_upload_per_min));

    // Terminal push endpoint, registered ahead of the API scope so it only carries its own limiter
    cfg.service(
        web::resource(format!("{}/attendance/upload", config.api_prefix))
            .wrap(upload_limiter)
            .route(web::post().to(attendance::upload_logs)),
    );

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(api_limiter) // rate limiting
            .service(
                web::scope("/devices")
                    // /devices
                    .service(
                        web::resource("")
                            .route(web::get().to(device::list_devices))
                            .route(web::post().to(device::register_device)),
                    )
                    // /devices/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(device::get_device))
                            .route(web::put().to(device::update_device))
                            .route(web::delete().to(device::delete_device)),
                    )
                    // /devices/{id}/command
                    .service(
                        web::resource("/{id}/command").route(web::post().to(device::send_command)),
                    )
                    // /devices/{id}/uploader
                    .service(
                        web::resource("/{id}/uploader")
                            .route(web::post().to(device::configure_uploader)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("/logs").route(web::get().to(attendance::list_logs)))
                    .service(
                        web::resource("/report/daily")
                            .route(web::get().to(attendance::daily_report)),
                    )
                    .service(
                        web::resource("/report/range")
                            .route(web::get().to(attendance::range_report)),
                    ),
            )
            .service(
                web::scope("/employees")
                    .service(web::resource("").route(web::get().to(employee::list_employees)))
                    .service(web::resource("/sync").route(web::post().to(employee::sync_employees))),
            )
            .service(
                web::scope("/sync")
                    .service(web::resource("/logs").route(web::post().to(sync::sync_logs)))
                    .service(
                        web::resource("/logs/{device_id}")
                            .route(web::post().to(sync::sync_device_logs)),
                    )
                    .service(web::resource("/employees").route(web::post().to(sync::sync_directory))),
            ),
    );
}
