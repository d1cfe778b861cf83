#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use bakaru::app::{self, events::UserEvent, file_dialog::NativeDialogService, EventOutcome};
use bakaru::config;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tao::{
    event::{Event, StartCause, WindowEvent},
    event_loop::{ControlFlow, EventLoopBuilder},
    window::WindowBuilder,
};
use tracing_subscriber::EnvFilter;
use wry::WebViewBuilder;

/// Overrides the config/cache directory (portable installs, testing).
const DATA_DIR_ENV: &str = "BAKARU_DATA_DIR";
/// Loads the page from a dev server instead of the bundled HTML.
const DEV_URL_ENV: &str = "BAKARU_DEV_URL";

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_dir = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
    let initial_state = app::state::AppState::bootstrap(data_dir).await;
    let (width, height) = initial_state.config.window_size;
    let (pos_x, pos_y) = initial_state.config.window_position;

    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();

    let window = WindowBuilder::new()
        .with_title("Bakaru")
        .with_inner_size(tao::dpi::LogicalSize::new(width, height))
        .with_position(tao::dpi::LogicalPosition::new(pos_x, pos_y))
        .with_min_inner_size(tao::dpi::LogicalSize::new(640, 480))
        .build(&event_loop)
        .expect("Failed to build Window");
    let window = Arc::new(window);

    let proxy = event_loop.create_proxy();
    let state = Arc::new(Mutex::new(initial_state));
    let dialog_service = Arc::new(NativeDialogService {});

    let ipc_handler_state = state.clone();
    let ipc_handler_proxy = proxy.clone();
    let ipc_handler_dialog = dialog_service.clone();
    let ipc_handler = move |message: String| {
        app::handle_ipc_message(
            message,
            ipc_handler_dialog.clone(),
            ipc_handler_proxy.clone(),
            ipc_handler_state.clone(),
        );
    };

    let webview_builder = match std::env::var(DEV_URL_ENV) {
        Ok(url) => {
            tracing::info!("Loading UI from dev server {}", url);
            WebViewBuilder::new(&*window).with_url(&url)
        }
        Err(_) => WebViewBuilder::new(&*window).with_html(include_str!("ui/index.html")),
    };

    let webview = webview_builder
        .with_devtools(cfg!(debug_assertions))
        .with_ipc_handler(ipc_handler)
        .build()
        .expect("Failed to build WebView");

    let state_for_events = state.clone();
    let window_for_events = window.clone();
    let proxy_for_events = proxy.clone();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::NewEvents(StartCause::Init) => {
                tracing::info!("Application initialized.");
            }
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    tracing::info!("Close requested. Saving window state and flushing cache...");
                    {
                        let mut state_guard = app::helpers::lock_state(&state_for_events);
                        let size = window_for_events.inner_size();
                        let position = window_for_events.outer_position().unwrap_or_default();
                        state_guard.config.window_size = (size.width.into(), size.height.into());
                        state_guard.config.window_position = (position.x.into(), position.y.into());
                        if let Err(e) = config::settings::save_config(
                            &state_guard.config,
                            state_guard.data_dir.as_deref(),
                        ) {
                            tracing::error!("Failed to save config on exit: {}", e);
                        }
                    }

                    window_for_events.set_visible(false);
                    // Exit happens on FlushFinished.
                    app::tasks::flush_cache_then_quit(
                        proxy_for_events.clone(),
                        state_for_events.clone(),
                    );
                }
                _ => (),
            },
            Event::UserEvent(user_event) => {
                let outcome = app::handle_user_event(
                    user_event,
                    &webview,
                    &window_for_events,
                    dialog_service.as_ref(),
                );
                if outcome == EventOutcome::Exit {
                    *control_flow = ControlFlow::Exit;
                }
            }
            _ => (),
        }
    });
}
