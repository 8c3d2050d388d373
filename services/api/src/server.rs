use crate::cli::ServeArgs;
use crate::infra::{load_directory, AppState};
use crate::routes::with_shift_board_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use shiftboard::config::AppConfig;
use shiftboard::error::AppError;
use shiftboard::memory::{InMemoryAuditLog, InMemoryNotifications, InMemoryShiftRepository};
use shiftboard::notifications::NotificationDesk;
use shiftboard::telemetry;
use shiftboard::workflows::reporting::ReportService;
use shiftboard::workflows::shifts::ShiftService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let directory = Arc::new(load_directory(&config.directory)?);
    let repository = Arc::new(InMemoryShiftRepository::default());
    let notifications = Arc::new(InMemoryNotifications::default());
    let audit = Arc::new(InMemoryAuditLog::default());

    let shift_service = Arc::new(ShiftService::new(
        repository.clone(),
        directory.clone(),
        notifications.clone(),
        audit.clone(),
    ));
    let desk = Arc::new(NotificationDesk::new(directory.clone(), notifications.clone()));
    let report_service = Arc::new(ReportService::new(
        repository,
        directory,
        notifications,
        audit,
    ));

    let app = with_shift_board_routes(shift_service, desk, report_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "shift board ready");

    axum::serve(listener, app).await?;
    Ok(())
}
