//! Normalización del árbol crudo que devuelve el LLM.
//!
//! Asigna a cada nodo un id único determinista basado en su camino
//! (`root`, `root-0`, `root-0-1`, ...), resuelve la etiqueta entre los
//! campos `name`/`topic` y rellena los opcionales ausentes. El árbol
//! resultante es inmutable y es la única clave estable con la que el
//! controlador de interacción sigue al nodo expandido entre relayouts.

use crate::models::{RawNode, TreeNode};

/// Id centinela del nodo raíz.
pub const ROOT_ID: &str = "root";

/// Etiqueta de relleno para nodos sin `name` ni `topic`.
const PLACEHOLDER_LABEL: &str = "Sin título";

/// Normaliza un árbol crudo. Función pura y total: cualquier entrada
/// (incluido un objeto vacío) produce un árbol válido. Dos entradas
/// estructuralmente idénticas producen exactamente los mismos ids.
pub fn normalize(raw: &RawNode) -> TreeNode {
    normalize_node(raw, ROOT_ID.to_string(), 0)
}

fn normalize_node(raw: &RawNode, id: String, depth: u32) -> TreeNode {
    // `name` tiene prioridad sobre `topic`; cadenas en blanco cuentan
    // como ausentes.
    let label = non_blank(&raw.name)
        .or_else(|| non_blank(&raw.topic))
        .unwrap_or_else(|| PLACEHOLDER_LABEL.to_string());

    let children = raw
        .children
        .iter()
        .enumerate()
        .map(|(index, child)| normalize_node(child, format!("{id}-{index}"), depth + 1))
        .collect();

    TreeNode {
        id,
        label,
        description: non_blank(&raw.description),
        is_leaf: raw.is_leaf_node.unwrap_or(false),
        depth,
        children,
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Cuenta todos los nodos del árbol, incluida la raíz.
pub fn count_nodes(node: &TreeNode) -> usize {
    1 + node.children.iter().map(count_nodes).sum::<usize>()
}

/// Profundidad máxima del árbol (0 si sólo existe la raíz).
pub fn max_depth(node: &TreeNode) -> u32 {
    node.children
        .iter()
        .map(max_depth)
        .max()
        .unwrap_or(node.depth)
}

/// Búsqueda recursiva de sólo lectura por id.
pub fn find_node<'a>(node: &'a TreeNode, id: &str) -> Option<&'a TreeNode> {
    if node.id == id {
        return Some(node);
    }
    node.children.iter().find_map(|child| find_node(child, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, children: Vec<RawNode>) -> RawNode {
        RawNode {
            name: Some(name.to_string()),
            children,
            ..RawNode::default()
        }
    }

    #[test]
    fn ids_deterministas_y_posicionales() {
        let input = raw("Sol", vec![raw("Planetas", vec![raw("Tierra", vec![])])]);
        let a = normalize(&input);
        let b = normalize(&input);

        assert_eq!(a.id, "root");
        assert_eq!(a.children[0].id, "root-0");
        assert_eq!(a.children[0].children[0].id, "root-0-0");

        // Misma entrada ⇒ mismos ids en las mismas posiciones.
        assert_eq!(a.children[0].id, b.children[0].id);
        assert_eq!(a.children[0].children[0].id, b.children[0].children[0].id);
    }

    #[test]
    fn ids_unicos_en_todo_el_arbol() {
        let input = raw(
            "A",
            vec![
                raw("B", vec![raw("C", vec![]), raw("D", vec![])]),
                raw("E", vec![raw("F", vec![])]),
            ],
        );
        let tree = normalize(&input);

        let mut ids = Vec::new();
        collect_ids(&tree, &mut ids);
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
        assert_eq!(total, count_nodes(&tree));
    }

    fn collect_ids(node: &TreeNode, out: &mut Vec<String>) {
        out.push(node.id.clone());
        for child in &node.children {
            collect_ids(child, out);
        }
    }

    #[test]
    fn profundidad_de_cada_hijo_es_padre_mas_uno() {
        let input = raw("A", vec![raw("B", vec![raw("C", vec![])]), raw("D", vec![])]);
        let tree = normalize(&input);
        assert_eq!(tree.depth, 0);
        check_depths(&tree);
    }

    fn check_depths(node: &TreeNode) {
        for child in &node.children {
            assert_eq!(child.depth, node.depth + 1);
            check_depths(child);
        }
    }

    #[test]
    fn objeto_vacio_produce_arbol_valido() {
        let tree = normalize(&RawNode::default());
        assert_eq!(tree.id, "root");
        assert_eq!(tree.label, "Sin título");
        assert_eq!(tree.description, None);
        assert!(!tree.is_leaf);
        assert!(tree.children.is_empty());
    }

    #[test]
    fn name_tiene_prioridad_sobre_topic() {
        let input = RawNode {
            name: Some("Etiqueta".to_string()),
            topic: Some("Tema".to_string()),
            ..RawNode::default()
        };
        assert_eq!(normalize(&input).label, "Etiqueta");

        let solo_topic = RawNode {
            topic: Some("Tema".to_string()),
            ..RawNode::default()
        };
        assert_eq!(normalize(&solo_topic).label, "Tema");
    }

    #[test]
    fn descripcion_en_blanco_cuenta_como_ausente() {
        let input = RawNode {
            name: Some("A".to_string()),
            description: Some("   ".to_string()),
            ..RawNode::default()
        };
        assert_eq!(normalize(&input).description, None);
    }

    #[test]
    fn busqueda_y_contadores() {
        let input = raw("Sol", vec![raw("Planetas", vec![raw("Tierra", vec![])])]);
        let tree = normalize(&input);

        assert_eq!(count_nodes(&tree), 3);
        assert_eq!(max_depth(&tree), 2);
        assert_eq!(find_node(&tree, "root-0-0").unwrap().label, "Tierra");
        assert!(find_node(&tree, "root-9").is_none());
    }

    #[test]
    fn deserializa_campos_con_alias_del_llm() {
        let json = r#"{
            "topic": "Tema central",
            "children": [
                {"name": "Rama", "isLeafNode": true, "children": []}
            ]
        }"#;
        let raw: RawNode = serde_json::from_str(json).unwrap();
        let tree = normalize(&raw);
        assert_eq!(tree.label, "Tema central");
        assert!(tree.children[0].is_leaf);
    }
}
