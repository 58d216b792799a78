//! Controlador de interacción: estado de la vista y sesión por mapa.
//!
//! Cada mapa generado vive en una `MapSession` guardada en el estado
//! compartido y mutada bajo su candado. El estado de la vista es un
//! objeto de valor explícito (`LayoutState`) que se pasa a la función
//! pura de layout; cada transición que lo cambia provoca un relayout
//! completo, nunca un parcheo incremental.
//!
//! Las peticiones asíncronas (contenido ampliado, respuestas de chat)
//! se comprometen con un número de secuencia de activación: si el nodo
//! activo cambió mientras estaban en vuelo, el resultado se descarta
//! en silencio y nunca pisa el estado de la activación nueva.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{ChatMessage, ChatRole, PanTransform, TreeNode, Viewport};
use crate::tree;

/// Estado de la vista sobre el que se calcula cada layout.
/// Como mucho un nodo está activo a la vez.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutState {
    pub active_node_id: Option<String>,
    pub zoom: f64,
    pub pan: PanTransform,
    pub is_fullscreen: bool,
}

impl LayoutState {
    pub const ZOOM_MIN: f64 = 0.5;
    pub const ZOOM_MAX: f64 = 3.0;
    pub const ZOOM_STEP: f64 = 0.2;
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            active_node_id: None,
            zoom: 1.0,
            pan: PanTransform::default(),
            is_fullscreen: false,
        }
    }
}

impl LayoutState {
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + Self::ZOOM_STEP).min(Self::ZOOM_MAX);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - Self::ZOOM_STEP).max(Self::ZOOM_MIN);
    }

    /// Zoom continuo del gesto de arrastre, con los mismos topes.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(Self::ZOOM_MIN, Self::ZOOM_MAX);
    }

    pub fn reset_view(&mut self) {
        self.zoom = 1.0;
        self.pan = PanTransform::default();
    }

    pub fn toggle_fullscreen(&mut self) {
        self.is_fullscreen = !self.is_fullscreen;
    }
}

/// Estados del panel de contenido ampliado.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PanelState {
    Hidden,
    Loading,
    Ready { content: String },
    Failed { message: String },
}

/// Sesión de un mapa mental: árbol normalizado, estado de la vista,
/// panel de contenido y transcripción de la conversación.
pub struct MapSession {
    pub id: Uuid,
    pub query: String,
    pub tree: TreeNode,
    pub viewport: Viewport,
    pub state: LayoutState,
    pub panel: PanelState,
    pub transcript: Vec<ChatMessage>,
    /// Secuencia de activación vigente; los resultados en vuelo que la
    /// traigan desfasada se descartan.
    activation_seq: u64,
    pub created_at: String,
}

impl MapSession {
    pub fn new(query: String, tree: TreeNode, viewport: Viewport) -> Self {
        Self {
            id: Uuid::new_v4(),
            query,
            tree,
            viewport,
            state: LayoutState::default(),
            panel: PanelState::Hidden,
            transcript: Vec::new(),
            activation_seq: 0,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    /// Alterna el nodo activo. Activar el que ya lo está lo repliega;
    /// activar otro hace el cambio de forma atómica. Cualquier cambio
    /// invalida el panel y la transcripción de la activación anterior.
    /// Devuelve `true` si el nodo quedó activo.
    pub fn toggle_active(&mut self, node_id: &str) -> bool {
        let already_active = self.state.active_node_id.as_deref() == Some(node_id);
        if already_active || tree::find_node(&self.tree, node_id).is_none() {
            self.clear_activation();
            return false;
        }
        self.state.active_node_id = Some(node_id.to_string());
        self.invalidate_activation();
        true
    }

    /// Repliega el nodo activo (clic en el fondo o cierre explícito).
    pub fn clear_activation(&mut self) {
        self.state.active_node_id = None;
        self.invalidate_activation();
    }

    fn invalidate_activation(&mut self) {
        self.activation_seq += 1;
        self.panel = PanelState::Hidden;
        self.transcript.clear();
    }

    /// Sustituye el árbol tras regenerar los datos. El nodo activo se
    /// conserva sólo si su id sigue resolviendo en el árbol nuevo; si
    /// no, se repliega en silencio. El panel y la conversación
    /// pertenecen en todo caso a la activación anterior.
    pub fn replace_tree(&mut self, query: String, tree: TreeNode) {
        let keep = self
            .state
            .active_node_id
            .as_deref()
            .is_some_and(|id| tree::find_node(&tree, id).is_some());
        self.query = query;
        self.tree = tree;
        if !keep {
            self.state.active_node_id = None;
        }
        self.invalidate_activation();
    }

    /// Etiqueta del nodo activo, si lo hay.
    pub fn active_topic(&self) -> Option<String> {
        self.state
            .active_node_id
            .as_deref()
            .and_then(|id| tree::find_node(&self.tree, id))
            .map(|node| node.label.clone())
    }

    // --- Panel de contenido ampliado ---

    /// Pasa el panel a `Loading` y devuelve la secuencia con la que el
    /// generador externo deberá comprometer su resultado.
    pub fn begin_content_request(&mut self) -> u64 {
        self.panel = PanelState::Loading;
        self.activation_seq
    }

    /// Compromete el resultado del generador si la activación sigue
    /// vigente. Devuelve `false` (y no toca nada) si llegó obsoleto.
    pub fn commit_content(&mut self, seq: u64, result: Result<String, String>) -> bool {
        if seq != self.activation_seq {
            return false;
        }
        self.panel = match result {
            Ok(content) => PanelState::Ready { content },
            Err(message) => PanelState::Failed { message },
        };
        true
    }

    /// Cierra el panel descartando el contenido y la conversación, y
    /// deja obsoleta cualquier petición en vuelo. El nodo sigue activo.
    pub fn close_panel(&mut self) {
        self.invalidate_activation();
    }

    // --- Conversación ---

    /// Añade inmediatamente la pregunta del usuario y devuelve la
    /// secuencia con la que debe comprometerse la respuesta diferida.
    pub fn push_user_message(&mut self, content: String) -> u64 {
        self.transcript.push(ChatMessage {
            role: ChatRole::User,
            content,
        });
        self.activation_seq
    }

    /// Añade la respuesta del asistente si la activación sigue vigente.
    pub fn push_assistant_message(&mut self, seq: u64, content: String) -> bool {
        if seq != self.activation_seq {
            return false;
        }
        self.transcript.push(ChatMessage {
            role: ChatRole::Assistant,
            content,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawNode;

    fn sample_session() -> MapSession {
        let raw: RawNode = serde_json::from_str(
            r#"{
                "name": "Sol",
                "children": [
                    {"name": "Planetas", "children": [
                        {"name": "Tierra", "isLeafNode": true, "children": []}
                    ]},
                    {"name": "Cometas", "children": []}
                ]
            }"#,
        )
        .unwrap();
        MapSession::new(
            "sistema solar".to_string(),
            tree::normalize(&raw),
            Viewport::default(),
        )
    }

    #[test]
    fn el_zoom_queda_acotado_y_reset_vuelve_a_uno() {
        let mut state = LayoutState::default();
        for _ in 0..20 {
            state.zoom_in();
        }
        assert_eq!(state.zoom, LayoutState::ZOOM_MAX);

        for _ in 0..40 {
            state.zoom_out();
        }
        assert_eq!(state.zoom, LayoutState::ZOOM_MIN);

        state.pan = PanTransform { x: 12.0, y: -4.0, scale: 2.0 };
        state.reset_view();
        assert_eq!(state.zoom, 1.0);
        assert_eq!(state.pan.x, 0.0);
        assert_eq!(state.pan.y, 0.0);

        state.set_zoom(99.0);
        assert_eq!(state.zoom, LayoutState::ZOOM_MAX);
        state.set_zoom(0.01);
        assert_eq!(state.zoom, LayoutState::ZOOM_MIN);
    }

    #[test]
    fn activar_dos_veces_repliega() {
        let mut session = sample_session();
        assert!(session.toggle_active("root-0"));
        assert_eq!(session.state.active_node_id.as_deref(), Some("root-0"));
        assert!(!session.toggle_active("root-0"));
        assert_eq!(session.state.active_node_id, None);
    }

    #[test]
    fn activar_otro_nodo_intercambia_y_limpia_la_conversacion() {
        let mut session = sample_session();
        session.toggle_active("root-0");
        session.push_user_message("¿qué es?".to_string());
        assert_eq!(session.transcript.len(), 1);

        // Sólo un nodo activo a la vez; el cambio limpia lo anterior.
        assert!(session.toggle_active("root-1"));
        assert_eq!(session.state.active_node_id.as_deref(), Some("root-1"));
        assert!(session.transcript.is_empty());
        assert!(matches!(session.panel, PanelState::Hidden));
    }

    #[test]
    fn un_id_desconocido_repliega_en_silencio() {
        let mut session = sample_session();
        session.toggle_active("root-0");
        assert!(!session.toggle_active("root-99"));
        assert_eq!(session.state.active_node_id, None);
    }

    #[test]
    fn una_respuesta_obsoleta_se_descarta() {
        let mut session = sample_session();
        session.toggle_active("root-0");
        let seq = session.begin_content_request();

        // El usuario activa otro nodo antes de que llegue la respuesta.
        session.toggle_active("root-1");
        assert!(!session.commit_content(seq, Ok("texto antiguo".to_string())));
        assert!(matches!(session.panel, PanelState::Hidden));

        // La activación vigente sí se compromete con normalidad.
        let seq2 = session.begin_content_request();
        assert!(session.commit_content(seq2, Ok("texto nuevo".to_string())));
        match &session.panel {
            PanelState::Ready { content } => assert_eq!(content, "texto nuevo"),
            other => panic!("panel inesperado: {other:?}"),
        }
    }

    #[test]
    fn el_fallo_del_generador_queda_local_al_panel() {
        let mut session = sample_session();
        session.toggle_active("root-0");
        let seq = session.begin_content_request();
        assert!(session.commit_content(seq, Err("sin conexión".to_string())));
        assert!(matches!(session.panel, PanelState::Failed { .. }));
        // El nodo sigue activo: el fallo no afecta al resto del diagrama.
        assert_eq!(session.state.active_node_id.as_deref(), Some("root-0"));
    }

    #[test]
    fn cerrar_el_panel_invalida_lo_pendiente_sin_replegar() {
        let mut session = sample_session();
        session.toggle_active("root-0");
        let seq = session.begin_content_request();
        session.push_user_message("hola".to_string());

        session.close_panel();
        assert!(session.transcript.is_empty());
        assert!(!session.commit_content(seq, Ok("tarde".to_string())));
        assert_eq!(session.state.active_node_id.as_deref(), Some("root-0"));
    }

    #[test]
    fn la_respuesta_de_chat_obsoleta_no_reaparece() {
        let mut session = sample_session();
        session.toggle_active("root-0");
        let seq = session.push_user_message("¿ventajas?".to_string());

        session.toggle_active("root-1");
        assert!(!session.push_assistant_message(seq, "respuesta vieja".to_string()));
        assert!(session.transcript.is_empty());
    }

    #[test]
    fn regenerar_conserva_el_activo_solo_si_resuelve() {
        let mut session = sample_session();
        session.toggle_active("root-0");

        // El árbol nuevo conserva un nodo con el mismo id.
        let raw: RawNode = serde_json::from_str(
            r#"{"name": "Sol", "children": [{"name": "Lunas", "children": []}]}"#,
        )
        .unwrap();
        session.replace_tree("sistema solar".to_string(), tree::normalize(&raw));
        assert_eq!(session.state.active_node_id.as_deref(), Some("root-0"));

        // Un árbol sin ese id repliega en silencio.
        let raw: RawNode = serde_json::from_str(r#"{"name": "Sol", "children": []}"#).unwrap();
        session.replace_tree("sol".to_string(), tree::normalize(&raw));
        assert_eq!(session.state.active_node_id, None);
    }
}
