//! Modelos de dominio (árbol crudo del LLM, árbol normalizado y
//! estructuras del layout radial que consume el frontend).

use serde::{Deserialize, Serialize};

/// Nodo del mapa mental tal y como llega del LLM, sin validar.
/// El título puede venir como `name` o como `topic` según el nivel que
/// genere el modelo; ambos son opcionales y la normalización elige.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNode {
    pub name: Option<String>,
    pub topic: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "isLeafNode")]
    pub is_leaf_node: Option<bool>,
    #[serde(default)]
    pub children: Vec<RawNode>,
}

/// Nodo normalizado e inmutable: id único determinista, etiqueta
/// resuelta y profundidad asignada. Es la única forma de árbol que
/// usa el resto del sistema.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub is_leaf: bool,
    pub depth: u32,
    pub children: Vec<TreeNode>,
}

/// Dimensiones del área de dibujo, suministradas por el cliente.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1024.0, height: 768.0 }
    }
}

/// Nodo posicionado para una pasada de render. Efímero: se recalcula
/// en cada layout y nunca se persiste.
#[derive(Debug, Clone, Serialize)]
pub struct PositionedNode {
    pub id: String,
    /// Etiqueta ya truncada (nodo inactivo) o completa (nodo activo).
    pub label: String,
    pub description: Option<String>,
    pub depth: u32,
    pub is_leaf: bool,
    pub has_children: bool,
    pub is_active: bool,
    /// Ángulo en radianes dentro de [0, 2π).
    pub angle: f64,
    pub radius: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
    pub stroke: String,
    /// Líneas de la etiqueta ajustadas al ancho de la caja (sólo para
    /// el nodo activo; vacío en el resto).
    pub label_lines: Vec<String>,
    pub description_lines: Vec<String>,
}

/// Arista padre→hijo con su curva radial ya calculada como path SVG.
#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub path: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub dashed: bool,
}

/// Resultado declarativo de una pasada de layout. El frontend lo pinta
/// tal cual; el servidor no conoce la superficie de dibujo.
#[derive(Debug, Clone, Serialize)]
pub struct MindMapLayout {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<Edge>,
    pub radius: f64,
    pub zoom: f64,
    pub pan: PanTransform,
    pub is_fullscreen: bool,
    pub width: f64,
    pub height: f64,
}

/// Transformación de encuadre acumulada por los gestos de arrastre.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PanTransform {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for PanTransform {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, scale: 1.0 }
    }
}

/// Entrada de la conversación del panel de contenido. Secuencia
/// ordenada y de sólo-añadir, ligada a la activación actual.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}
