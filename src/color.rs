//! Asignación de color por rama principal.
//!
//! La raíz usa un color fijo; cada nodo de profundidad 1 recibe un
//! color de una paleta finita según el orden en que se ve su etiqueta,
//! y todos sus descendientes lo heredan, de modo que cada rama es
//! monocroma sea cual sea su profundidad.

/// Paleta ordinal para las ramas principales.
pub const BRANCH_PALETTE: [&str; 6] = [
    "#4f46e5", // índigo
    "#06b6d4", // cian
    "#ec4899", // rosa
    "#f59e0b", // ámbar
    "#10b981", // esmeralda
    "#8b5cf6", // violeta
];

/// Relleno del nodo raíz.
pub const ROOT_FILL: &str = "#6366f1";

/// Color neutro (trazos de la raíz, bordes y cajas activas).
pub const NEUTRAL: &str = "#ffffff";

/// Borde de resaltado del nodo activo.
pub const ACTIVE_STROKE: &str = "#6366f1";

/// Escala ordinal: la misma etiqueta recibe siempre el mismo color
/// dentro de una pasada de render; etiquetas nuevas van tomando
/// entradas de la paleta en orden de primera aparición, reciclando
/// cuando se agota.
#[derive(Debug, Default)]
pub struct BranchColorScale {
    seen: Vec<String>,
}

impl BranchColorScale {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color_for(&mut self, label: &str) -> &'static str {
        let index = match self.seen.iter().position(|s| s == label) {
            Some(i) => i,
            None => {
                self.seen.push(label.to_string());
                self.seen.len() - 1
            }
        };
        BRANCH_PALETTE[index % BRANCH_PALETTE.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misma_etiqueta_mismo_color() {
        let mut scale = BranchColorScale::new();
        let a = scale.color_for("Historia");
        let _ = scale.color_for("Ciencia");
        let b = scale.color_for("Historia");
        assert_eq!(a, b);
    }

    #[test]
    fn etiquetas_distintas_colores_distintos_hasta_agotar_la_paleta() {
        let mut scale = BranchColorScale::new();
        let colors: Vec<&str> = (0..BRANCH_PALETTE.len())
            .map(|i| scale.color_for(&format!("rama-{i}")))
            .collect();
        let mut unique = colors.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), colors.len());
    }

    #[test]
    fn la_paleta_se_recicla_en_orden() {
        let mut scale = BranchColorScale::new();
        for i in 0..BRANCH_PALETTE.len() {
            scale.color_for(&format!("rama-{i}"));
        }
        // La séptima etiqueta vuelve al principio de la paleta.
        assert_eq!(scale.color_for("extra"), BRANCH_PALETTE[0]);
    }
}
