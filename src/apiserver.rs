// apiserver.rs

use std::convert::Infallible;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Response, StatusCode, header},
    response::{
        Html, IntoResponse,
        sse::{Event, Sse},
    },
    routing::*,
};
use chrono::Utc;
use futures::{Stream, StreamExt};

use crate::*;

pub fn api_router(state: Arc<MyState>) -> Router {
    let mut app: Router<Arc<MyState>> = Router::new()
        .route("/", get(get_index))
        .route("/favicon.ico", get(get_favicon))
        .route("/index.css", get(get_indexcss))
        .route("/uptime", get(get_uptime))
        .route("/readings", get(get_readings))
        .route("/config", get(get_config));

    for id in ChannelId::all() {
        app = app.route(
            &id.path(),
            get(move |State(state): State<Arc<MyState>>| connect_client(state, id)),
        );
    }

    app.with_state(state)
}

pub async fn run_api_server(state: Arc<MyState>) -> anyhow::Result<()> {
    let listen = format!("0.0.0.0:{}", state.config.port);
    let addr = listen.parse::<net::SocketAddr>()?;

    let app = api_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening to {listen}");
    Ok(axum::serve(listener, app.into_make_service()).await?)
}

pub async fn get_index(State(state): State<Arc<MyState>>) -> Response<Body> {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_index()");

    (StatusCode::OK, Html(state.index_html.clone())).into_response()
}

pub async fn get_favicon(State(state): State<Arc<MyState>>) -> Response<Body> {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_favicon()");

    let favicon = include_bytes!("favicon.ico");
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/vnd.microsoft.icon")],
        favicon.to_vec(),
    )
        .into_response()
}

pub async fn get_indexcss(State(state): State<Arc<MyState>>) -> Response<Body> {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_indexcss()");

    let indexcss = include_bytes!("index.css");
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        indexcss.to_vec(),
    )
        .into_response()
}

pub async fn get_uptime(State(state): State<Arc<MyState>>) -> (StatusCode, Json<Uptime>) {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_uptime()");

    let uptime = Uptime::new(state.uptime.load(Ordering::Relaxed));
    (StatusCode::OK, Json(uptime))
}

pub async fn get_readings(State(state): State<Arc<MyState>>) -> (StatusCode, Json<Readings>) {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_readings()");

    let now = Utc::now();
    let mut sensors = state.sensors.lock().await;
    let mut read = |metric: Metric| match metric.read(&mut **sensors) {
        Ok(v) => Some(v),
        Err(e) => {
            error!("{metric} read failed: {e:#}");
            None
        }
    };

    let ret = Readings {
        timestamp: now.timestamp(),
        last_update: now.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        temperature_c: read(Metric::TemperatureC),
        relative_humidity: read(Metric::Humidity),
        pressure_hpa: read(Metric::Pressure),
        temperature_f: read(Metric::TemperatureF),
    };
    (StatusCode::OK, Json(ret))
}

pub async fn get_config(State(state): State<Arc<MyState>>) -> (StatusCode, Json<MyConfig>) {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_config()");
    (StatusCode::OK, Json(state.config.clone()))
}

/// Replaces the channel's subscriber; the response stays open and carries its events.
pub async fn connect_client(
    state: Arc<MyState>,
    id: ChannelId,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} connect_client{id}()");

    let (conn, rx) = SseConnection::open();
    state.channels.lock().await.subscribe(id, conn);

    Sse::new(rx.map(|data: Payload| Ok(Event::default().data(data.as_str()))))
}

// EOF
