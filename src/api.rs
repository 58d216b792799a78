//! Capa HTTP de la aplicación: generación del mapa, relayout por
//! cambios de vista, activación de nodos, panel de contenido y chat.
//!
//! Todas las mutaciones de sesión ocurren bajo el candado del estado
//! compartido; las llamadas al LLM se hacen siempre fuera de él. El
//! trabajo en segundo plano (contenido ampliado, respuesta de chat) se
//! lanza con `tokio::spawn` y se compromete con el número de secuencia
//! de activación, de modo que los resultados obsoletos se descartan.

use std::time::Duration;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::spawn;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
    app_state::AppState,
    chat, layout,
    models::{ChatMessage, MindMapLayout, PanTransform, Viewport},
    session::{MapSession, PanelState},
    tree,
};

type ApiError = (StatusCode, Json<serde_json::Value>);

// --- Payloads y Respuestas de la API ---

#[derive(Deserialize)]
pub struct GenerateMapPayload {
    query: String,
    /// Si se indica una sesión existente, se regeneran sus datos
    /// conservando el nodo activo cuando siga resolviendo.
    session_id: Option<Uuid>,
    viewport: Option<Viewport>,
}

#[derive(Deserialize)]
pub struct ViewPayload {
    session_id: Uuid,
    viewport: Option<Viewport>,
    action: Option<ViewAction>,
    /// Transformación acumulada del gesto de arrastre/zoom continuo.
    pan: Option<PanTransform>,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewAction {
    ZoomIn,
    ZoomOut,
    Reset,
    ToggleFullscreen,
}

#[derive(Deserialize)]
pub struct ActivatePayload {
    session_id: Uuid,
    /// `None` equivale a un clic en el fondo: repliega el nodo activo.
    node_id: Option<String>,
}

#[derive(Deserialize)]
pub struct PanelOpenPayload {
    session_id: Uuid,
}

#[derive(Deserialize)]
pub struct PanelQuery {
    session_id: Uuid,
}

#[derive(Deserialize)]
pub struct ChatPayload {
    session_id: Uuid,
    question: String,
}

/// Instantánea del panel y la conversación de la activación vigente.
#[derive(Serialize, Debug)]
pub struct PanelSnapshot {
    pub panel: PanelState,
    pub transcript: Vec<ChatMessage>,
    pub topic: Option<String>,
}

/// Respuesta completa con la que el frontend repinta el diagrama.
#[derive(Serialize)]
pub struct MapResponse {
    pub session_id: Uuid,
    pub query: String,
    pub created_at: String,
    pub active_node_id: Option<String>,
    pub layout: MindMapLayout,
    pub panel: PanelSnapshot,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/generate-map", post(generate_map_handler))
        .route("/api/view", post(view_handler))
        .route("/api/activate", post(activate_handler))
        .route("/api/panel/open", post(panel_open_handler))
        .route("/api/panel", get(panel_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

// --- Utilidades internas ---

fn panel_snapshot(session: &MapSession) -> PanelSnapshot {
    PanelSnapshot {
        panel: session.panel.clone(),
        transcript: session.transcript.clone(),
        topic: session.active_topic(),
    }
}

fn map_response(session: &MapSession) -> MapResponse {
    MapResponse {
        session_id: session.id,
        query: session.query.clone(),
        created_at: session.created_at.clone(),
        active_node_id: session.state.active_node_id.clone(),
        layout: layout::layout(&session.tree, session.viewport, &session.state),
        panel: panel_snapshot(session),
    }
}

/// Ejecuta `f` sobre la sesión indicada bajo el candado del estado.
fn with_session<T>(
    state: &AppState,
    session_id: Uuid,
    f: impl FnOnce(&mut MapSession) -> T,
) -> Result<T, ApiError> {
    let mut sessions = state.sessions.lock().unwrap();
    match sessions.get_mut(&session_id) {
        Some(session) => Ok(f(session)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Sesión no encontrada. Genera un mapa nuevo."})),
        )),
    }
}

// --- Handlers ---

#[axum::debug_handler]
async fn generate_map_handler(
    State(state): State<AppState>,
    Json(payload): Json<GenerateMapPayload>,
) -> Result<Json<MapResponse>, ApiError> {
    let query = payload.query.trim().to_string();
    if query.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "El parámetro 'query' es obligatorio."})),
        ));
    }

    // La llamada al LLM se hace fuera del candado de sesiones.
    let raw = state.llm_manager.generate_mind_map(&query).await.map_err(|e| {
        error!("Error generando el mapa mental: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "No se pudo generar el mapa mental. Inténtalo de nuevo."})),
        )
    })?;
    let tree = tree::normalize(&raw);
    let node_count = tree::count_nodes(&tree);

    let mut sessions = state.sessions.lock().unwrap();
    let session_id = match payload.session_id {
        Some(id) if sessions.contains_key(&id) => {
            let session = sessions.get_mut(&id).expect("sesión recién comprobada");
            if let Some(viewport) = payload.viewport {
                session.viewport = viewport;
            }
            session.replace_tree(query, tree);
            id
        }
        _ => {
            let session =
                MapSession::new(query, tree, payload.viewport.unwrap_or_default());
            let id = session.id;
            sessions.insert(id, session);
            id
        }
    };

    let session = sessions.get(&session_id).expect("sesión recién insertada");
    info!("Mapa mental listo en la sesión {session_id} ({node_count} nodos)");
    Ok(Json(map_response(session)))
}

#[axum::debug_handler]
async fn view_handler(
    State(state): State<AppState>,
    Json(payload): Json<ViewPayload>,
) -> Result<Json<MapResponse>, ApiError> {
    with_session(&state, payload.session_id, |session| {
        if let Some(viewport) = payload.viewport {
            session.viewport = viewport;
        }
        match payload.action {
            Some(ViewAction::ZoomIn) => session.state.zoom_in(),
            Some(ViewAction::ZoomOut) => session.state.zoom_out(),
            Some(ViewAction::Reset) => session.state.reset_view(),
            Some(ViewAction::ToggleFullscreen) => session.state.toggle_fullscreen(),
            None => {}
        }
        if let Some(pan) = payload.pan {
            session.state.pan = pan;
            session.state.set_zoom(pan.scale);
        }
        Json(map_response(session))
    })
}

#[axum::debug_handler]
async fn activate_handler(
    State(state): State<AppState>,
    Json(payload): Json<ActivatePayload>,
) -> Result<Json<MapResponse>, ApiError> {
    with_session(&state, payload.session_id, |session| {
        match payload.node_id.as_deref() {
            Some(node_id) => {
                let active = session.toggle_active(node_id);
                debug!(
                    "Nodo {node_id} {} en la sesión {}",
                    if active { "activado" } else { "replegado" },
                    payload.session_id
                );
            }
            // Clic en el fondo: repliega lo que hubiera.
            None => session.clear_activation(),
        }
        Json(map_response(session))
    })
}

#[axum::debug_handler]
async fn panel_open_handler(
    State(state): State<AppState>,
    Json(payload): Json<PanelOpenPayload>,
) -> Result<Json<PanelSnapshot>, ApiError> {
    let (snapshot, pending, has_active) =
        with_session(&state, payload.session_id, |session| {
            let pending = match (&session.panel, session.active_topic()) {
                // Una única petición al generador por activación.
                (PanelState::Hidden, Some(topic)) => {
                    let seq = session.begin_content_request();
                    Some((topic, seq))
                }
                (PanelState::Hidden, None) => None,
                // Abrir con el panel ya abierto lo cierra.
                _ => {
                    session.close_panel();
                    None
                }
            };
            let has_active = session.state.active_node_id.is_some();
            (panel_snapshot(session), pending, has_active)
        })?;

    if !has_active {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "No hay ningún nodo activo que ampliar."})),
        ));
    }

    if let Some((topic, seq)) = pending {
        let llm = state.llm_manager.clone();
        let sessions = state.sessions.clone();
        let session_id = payload.session_id;
        spawn(async move {
            let result = llm.generate_topic_content(&topic).await;

            let mut sessions = sessions.lock().unwrap();
            let Some(session) = sessions.get_mut(&session_id) else {
                return;
            };
            match result {
                Ok(content) => {
                    if session.commit_content(seq, Ok(content)) {
                        // Saludo inicial del asistente para la conversación.
                        session.push_assistant_message(
                            seq,
                            format!(
                                "Puedo darte más información sobre \"{topic}\". \
                                 ¿Tienes alguna pregunta sobre este tema?"
                            ),
                        );
                    } else {
                        debug!("Contenido descartado por obsoleto (sesión {session_id})");
                    }
                }
                Err(e) => {
                    error!("Error generando el contenido ampliado: {e}");
                    let _ = session.commit_content(
                        seq,
                        Err("No se pudo generar el contenido. Inténtalo de nuevo."
                            .to_string()),
                    );
                }
            }
        });
    }

    Ok(Json(snapshot))
}

#[axum::debug_handler]
async fn panel_handler(
    State(state): State<AppState>,
    Query(query): Query<PanelQuery>,
) -> Result<Json<PanelSnapshot>, ApiError> {
    with_session(&state, query.session_id, |session| Json(panel_snapshot(session)))
}

#[axum::debug_handler]
async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatPayload>,
) -> Result<Json<PanelSnapshot>, ApiError> {
    let question = payload.question.trim().to_string();
    if question.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "La pregunta no puede estar vacía."})),
        ));
    }

    let (snapshot, job) = with_session(&state, payload.session_id, |session| {
        match session.active_topic() {
            Some(topic) => {
                // La pregunta del usuario se añade inmediatamente; la
                // respuesta llega en diferido.
                let seq = session.push_user_message(question.clone());
                (panel_snapshot(session), Some((topic, seq)))
            }
            None => (panel_snapshot(session), None),
        }
    })?;

    let Some((topic, seq)) = job else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "No hay ningún nodo activo sobre el que conversar."})),
        ));
    };

    let sessions = state.sessions.clone();
    let session_id = payload.session_id;
    spawn(async move {
        // Latencia simulada del asistente de demostración.
        tokio::time::sleep(Duration::from_secs(1)).await;
        let answer = chat::generate_chat_response(&question, &topic);

        let mut sessions = sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(&session_id) {
            if !session.push_assistant_message(seq, answer) {
                debug!("Respuesta de chat descartada por obsoleta (sesión {session_id})");
            }
        }
    });

    Ok(Json(snapshot))
}

// --- Handler de Apagado ---

#[axum::debug_handler]
async fn shutdown_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Petición de apagado recibida.");
    if let Some(sender) = state.shutdown_sender.lock().unwrap().take() {
        let _ = sender.send(());
    }
    StatusCode::OK
}
