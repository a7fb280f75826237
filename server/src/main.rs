use crate::api::{
    EventRequest, EventResponse, PostedNotification, RegisterRequest, RegisterResponse,
    TokenResponse,
};
use crate::config::ServerConfig;
use crate::state::{ConfiguredApp, NotificationBoard, TokenStore};
use actix_web::{App, HttpResponse, HttpServer, Responder, get, post, web};
use common::{MessagingProvider, ProviderRegistry};
use log::*;
use lqd_push::{GcmProviderFactory, NotificationPresenter, PushReceiver, is_push_event};
use std::sync::Arc;

mod api;
mod config;
mod state;

struct AppState {
    receiver: PushReceiver,
    tokens: Arc<TokenStore>,
    board: Arc<NotificationBoard>,
    provider: Option<Arc<dyn MessagingProvider>>,
    sender_id: String,
}

#[get("/hello")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("Hello World!")
}

#[post("/events")]
async fn events(req: web::Json<EventRequest>, state: web::Data<AppState>) -> HttpResponse {
    debug!("Received event: {}", req.action);
    let is_push = is_push_event(&req.extras);
    let action = state.receiver.on_event(&req.action, &req.extras);
    HttpResponse::Ok().json(EventResponse { is_push, action })
}

#[post("/register")]
async fn register(req: web::Json<RegisterRequest>, state: web::Data<AppState>) -> HttpResponse {
    let sender_id = req
        .sender_id
        .clone()
        .unwrap_or_else(|| state.sender_id.clone());

    let provider = match &state.provider {
        Some(p) => p.clone(),
        None => {
            error!("No messaging provider configured");
            return HttpResponse::ServiceUnavailable().json(RegisterResponse {
                accepted: false,
                sender_id,
            });
        }
    };

    info!(
        "Registering device with {} for sender {}",
        provider.provider_info().name,
        sender_id
    );
    lqd_push::register_device(provider, state.tokens.clone(), sender_id.clone());

    HttpResponse::Accepted().json(RegisterResponse {
        accepted: true,
        sender_id,
    })
}

#[get("/token")]
async fn token(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(TokenResponse {
        token: state.tokens.current(),
    })
}

#[get("/notifications")]
async fn notifications(state: web::Data<AppState>) -> HttpResponse {
    let posted: Vec<PostedNotification> = state
        .board
        .snapshot()
        .into_iter()
        .map(|(id, spec)| PostedNotification { id, spec })
        .collect();
    HttpResponse::Ok().json(posted)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));

    let config = ServerConfig::load().map_err(std::io::Error::other)?;

    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(GcmProviderFactory));
    info!("Registered providers: {:?}", registry.list_providers());

    let provider: Option<Arc<dyn MessagingProvider>> = match &config.provider {
        Some(section) => match registry.create(&section.name, section.config.clone()) {
            Ok(p) => Some(Arc::from(p)),
            Err(e) => {
                error!("Failed to create provider '{}': {}", section.name, e);
                None
            }
        },
        None => None,
    };

    let tokens = Arc::new(TokenStore::default());
    let board = Arc::new(NotificationBoard::default());
    let presenter = NotificationPresenter::new(
        Arc::new(ConfiguredApp::new(config.app.clone())),
        board.clone(),
    );

    let state = web::Data::new(AppState {
        receiver: PushReceiver::new(tokens.clone(), presenter),
        tokens,
        board,
        provider,
        sender_id: config.sender_id.clone(),
    });

    info!("Listening on {}", config.bind);
    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(state.clone())
            .service(hello)
            .service(events)
            .service(register)
            .service(token)
            .service(notifications)
    })
    .bind(&config.bind)?
    .run()
    .await
}
