//! Motor de layout radial.
//!
//! Convierte el árbol normalizado y el estado de la vista en una lista
//! declarativa de nodos posicionados y aristas curvas que el frontend
//! pinta tal cual. Es una función pura: no muta el árbol y con las
//! mismas entradas produce exactamente el mismo resultado, así que se
//! puede relanzar en cada cambio de estado sin coste de coherencia.
//!
//! Disposición: las hojas se reparten en orden de recorrido con una
//! separación angular ponderada (más hueco entre ramas distintas y
//! alrededor de nodos hoja, menos en los anillos profundos) y cada
//! nodo interno queda en el punto medio angular de sus hijos. El radio
//! crece linealmente con la profundidad.

use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

use crate::color::{BranchColorScale, ACTIVE_STROKE, NEUTRAL, ROOT_FILL};
use crate::models::{Edge, MindMapLayout, PositionedNode, TreeNode, Viewport};
use crate::session::LayoutState;
use crate::text::{self, FontSpec};
use crate::tree;

/// Píxeles de radio que aporta cada nodo antes de topar con el ancho.
const RADIUS_PER_NODE: f64 = 15.0;

/// Radio mínimo al que se degrada con un viewport diminuto o nulo.
const MIN_RADIUS: f64 = 40.0;

/// Altura reservada a los controles en pantalla completa.
const FULLSCREEN_CHROME: f64 = 100.0;

/// Fracción de la altura de la ventana que ocupa el diagrama.
const HEIGHT_FRACTION: f64 = 0.7;

/// Radio del círculo del nodo raíz.
const ROOT_NODE_RADIUS: f64 = 40.0;

/// Calcula una pasada completa de layout para el árbol dado.
pub fn layout(tree: &TreeNode, viewport: Viewport, state: &LayoutState) -> MindMapLayout {
    let width = viewport.width.max(0.0);
    let height = if state.is_fullscreen {
        (viewport.height - FULLSCREEN_CHROME).max(0.0)
    } else {
        viewport.height.max(0.0) * HEIGHT_FRACTION
    };

    // Radio según el tamaño del árbol y del contenedor: los mapas
    // pequeños quedan compactos y los grandes no desbordan el ancho.
    let node_count = tree::count_nodes(tree) as f64;
    let base_radius = width.min(height) / 4.0;
    let radius = base_radius
        .max((node_count * RADIUS_PER_NODE).min(width / 2.0))
        .max(MIN_RADIUS);

    let depth_unit = radius / f64::from(tree::max_depth(tree).max(1));

    let angles = assign_angles(tree);

    let mut scale = BranchColorScale::new();
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    emit_node(
        tree,
        None,
        &angles,
        depth_unit,
        state.active_node_id.as_deref(),
        &mut scale,
        &mut nodes,
        &mut edges,
    );

    MindMapLayout {
        nodes,
        edges,
        radius,
        zoom: state.zoom,
        pan: state.pan,
        is_fullscreen: state.is_fullscreen,
        width,
        height,
    }
}

// --- Asignación angular ---

/// Separación angular entre dos nodos adyacentes del recorrido.
/// Mayor entre ramas distintas que entre hermanos, mayor aún junto a
/// nodos hoja, y decreciente con la profundidad (los anillos exteriores
/// tienen más circunferencia por nodo). El divisor se acota a 1 para
/// que el primer anillo no dispare los huecos.
fn separation(a: &TreeNode, a_parent: Option<&str>, b: &TreeNode, b_parent: Option<&str>) -> f64 {
    let same_parent = match (a_parent, b_parent) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    };
    let base = if same_parent { 1.5 } else { 2.5 };
    let sep = base / f64::from(a.depth.max(1));
    if a.is_leaf || b.is_leaf {
        sep * 1.5
    } else {
        sep
    }
}

fn collect_leaves<'a>(
    node: &'a TreeNode,
    parent: Option<&'a str>,
    out: &mut Vec<(&'a TreeNode, Option<&'a str>)>,
) {
    if node.children.is_empty() {
        out.push((node, parent));
    } else {
        for child in &node.children {
            collect_leaves(child, Some(node.id.as_str()), out);
        }
    }
}

/// Asigna a cada nodo su ángulo en [0, 2π). Las hojas acumulan las
/// separaciones en orden de recorrido; al normalizar se incluye un
/// hueco de cierre entre la última y la primera para que no colisionen
/// en 0 ≡ 2π. Los nodos internos quedan en el punto medio angular de
/// su primer y último hijo.
fn assign_angles(root: &TreeNode) -> HashMap<String, f64> {
    let mut leaves = Vec::new();
    collect_leaves(root, None, &mut leaves);

    let mut offsets: HashMap<String, f64> = HashMap::new();
    let mut cursor = 0.0;
    for (i, (leaf, parent)) in leaves.iter().enumerate() {
        if i > 0 {
            let (prev, prev_parent) = leaves[i - 1];
            cursor += separation(prev, prev_parent, leaf, *parent);
        }
        offsets.insert(leaf.id.clone(), cursor);
    }

    let total_span = if leaves.len() > 1 {
        let (first, first_parent) = leaves[0];
        let (last, last_parent) = leaves[leaves.len() - 1];
        cursor + separation(last, last_parent, first, first_parent)
    } else {
        1.0
    };

    fill_internal_offsets(root, &mut offsets);

    offsets
        .into_iter()
        .map(|(id, offset)| (id, offset / total_span * TAU))
        .collect()
}

fn fill_internal_offsets(node: &TreeNode, offsets: &mut HashMap<String, f64>) {
    if node.children.is_empty() {
        return;
    }
    for child in &node.children {
        fill_internal_offsets(child, offsets);
    }
    let first = offsets[&node.children[0].id];
    let last = offsets[&node.children[node.children.len() - 1].id];
    offsets.insert(node.id.clone(), (first + last) / 2.0);
}

// --- Emisión de nodos y aristas ---

/// Polar → cartesiano con un cuarto de vuelta de desfase para que el
/// ángulo 0 apunte hacia arriba.
fn radial_point(angle: f64, radius: f64) -> (f64, f64) {
    let a = angle - PI / 2.0;
    (radius * a.cos(), radius * a.sin())
}

/// Curva radial suave entre dos posiciones polares: cúbica con los
/// puntos de control al radio intermedio sobre el ángulo de cada
/// extremo.
fn edge_path(a0: f64, r0: f64, a1: f64, r1: f64) -> String {
    let (x0, y0) = radial_point(a0, r0);
    let (x3, y3) = radial_point(a1, r1);
    let mid = (r0 + r1) / 2.0;
    let (x1, y1) = radial_point(a0, mid);
    let (x2, y2) = radial_point(a1, mid);
    format!("M{x0:.2},{y0:.2}C{x1:.2},{y1:.2} {x2:.2},{y2:.2} {x3:.2},{y3:.2}")
}

#[allow(clippy::too_many_arguments)]
fn emit_node(
    node: &TreeNode,
    inherited_color: Option<&'static str>,
    angles: &HashMap<String, f64>,
    depth_unit: f64,
    active_id: Option<&str>,
    scale: &mut BranchColorScale,
    nodes: &mut Vec<PositionedNode>,
    edges: &mut Vec<Edge>,
) {
    // El color de rama se fija en profundidad 1 y se hereda hacia
    // abajo: cada rama es monocroma.
    let branch_color = match node.depth {
        0 => None,
        1 => Some(scale.color_for(&node.label)),
        _ => inherited_color,
    };

    let angle = angles.get(&node.id).copied().unwrap_or(0.0);
    let node_radius = f64::from(node.depth) * depth_unit;
    let (x, y) = radial_point(angle, node_radius);

    let is_active = active_id == Some(node.id.as_str());
    let branch = branch_color.unwrap_or(NEUTRAL);

    let (fill, stroke) = if node.depth == 0 {
        (ROOT_FILL, NEUTRAL)
    } else if is_active {
        (NEUTRAL, ACTIVE_STROKE)
    } else if node.is_leaf {
        (NEUTRAL, branch)
    } else {
        (branch, NEUTRAL)
    };

    let (label, label_lines, description_lines) = if is_active && node.depth > 0 {
        let label_font = FontSpec::new(12.0, true);
        let desc_font = FontSpec::new(10.0, false);
        let lines = text::wrap_text(&node.label, text::ACTIVE_WRAP_WIDTH, label_font);
        let desc_lines = node
            .description
            .as_deref()
            .map(|d| text::wrap_text(d, text::ACTIVE_WRAP_WIDTH, desc_font))
            .unwrap_or_default();
        (node.label.clone(), lines, desc_lines)
    } else {
        (text::truncate_label(&node.label, node.depth), Vec::new(), Vec::new())
    };

    let size = if node.depth == 0 {
        text::BoxSize {
            width: ROOT_NODE_RADIUS * 2.0,
            height: ROOT_NODE_RADIUS * 2.0,
        }
    } else {
        text::size_box(&node.label, node.description.as_deref(), node.depth, is_active)
    };

    nodes.push(PositionedNode {
        id: node.id.clone(),
        label,
        description: node.description.clone(),
        depth: node.depth,
        is_leaf: node.is_leaf,
        has_children: !node.children.is_empty(),
        is_active,
        angle,
        radius: node_radius,
        x,
        y,
        width: size.width,
        height: size.height,
        fill: fill.to_string(),
        stroke: stroke.to_string(),
        label_lines,
        description_lines,
    });

    // El trazo de la arista hereda el color de la rama; las aristas de
    // la raíz van en neutro y las que llegan a una hoja, discontinuas.
    let edge_stroke = if node.depth == 0 { NEUTRAL } else { branch };
    let stroke_width = (3.0 - f64::from(node.depth) * 0.5).max(1.0);

    for child in &node.children {
        let child_angle = angles.get(&child.id).copied().unwrap_or(0.0);
        let child_radius = f64::from(child.depth) * depth_unit;
        edges.push(Edge {
            source: node.id.clone(),
            target: child.id.clone(),
            path: edge_path(angle, node_radius, child_angle, child_radius),
            stroke: edge_stroke.to_string(),
            stroke_width,
            dashed: child.is_leaf,
        });
        emit_node(
            child,
            branch_color,
            angles,
            depth_unit,
            active_id,
            scale,
            nodes,
            edges,
        );
    }
}
