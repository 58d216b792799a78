use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::{config::AppConfig, llm::LlmManager, session::MapSession};

/// Estado compartido de la aplicación. Las sesiones de mapa viven en
/// memoria y se mutan siempre bajo el candado; el layout se calcula a
/// partir de una instantánea coherente del estado.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub llm_manager: LlmManager,
    pub sessions: Arc<Mutex<HashMap<Uuid, MapSession>>>,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}
