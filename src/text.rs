//! Medición aproximada de texto, ajuste de línea y tamaño de cajas.
//!
//! El servidor no tiene un canvas donde medir texto, así que se usa una
//! métrica por clases de ancho de carácter proporcional al tamaño de la
//! fuente. Basta con que sea determinista y razonable: el frontend
//! pinta con una sans-serif cuyas proporciones se aproximan aquí.

/// Fuente efectiva con la que se mide un texto.
#[derive(Debug, Clone, Copy)]
pub struct FontSpec {
    pub size: f64,
    pub bold: bool,
}

impl FontSpec {
    pub const fn new(size: f64, bold: bool) -> Self {
        Self { size, bold }
    }
}

/// Ancho máximo del texto dentro de una caja expandida.
pub const ACTIVE_WRAP_WIDTH: f64 = 230.0;

/// Alto de línea del texto de un nodo expandido.
pub const LINE_HEIGHT: f64 = 16.0;

/// Dimensiones en píxeles de la caja de un nodo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSize {
    pub width: f64,
    pub height: f64,
}

/// Avance relativo de un carácter respecto al tamaño de fuente.
fn char_advance(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | '\'' | '|' | '!' | '.' | ',' | ':' | ';' => 0.35,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' => 0.45,
        ' ' => 0.4,
        'm' | 'w' | 'M' | 'W' | '@' => 0.95,
        'A'..='Z' | '0'..='9' => 0.72,
        c if (c as u32) < 0x2000 => 0.58,
        // CJK, tailandés y demás escrituras anchas.
        _ => 1.0,
    }
}

/// Ancho aproximado de `text` en píxeles para la fuente dada.
pub fn measure_text(text: &str, font: FontSpec) -> f64 {
    let bold_factor = if font.bold { 1.08 } else { 1.0 };
    text.chars().map(char_advance).sum::<f64>() * font.size * bold_factor
}

/// Ajuste de línea voraz: acumula palabras mientras la línea quepa en
/// `max_width` y corta al desbordar. Nunca parte una palabra: una
/// palabra más ancha que `max_width` ocupa su propia línea completa.
/// Un texto vacío (o un contenedor de ancho cero con texto vacío)
/// produce una única línea vacía.
pub fn wrap_text(text: &str, max_width: f64, font: FontSpec) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    let mut line = String::new();
    for word in words {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{line} {word}");
        if measure_text(&candidate, font) > max_width {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        } else {
            line = candidate;
        }
    }
    lines.push(line);
    lines
}

/// Recorte por número de caracteres para nodos sin expandir, con
/// límites decrecientes con la profundidad. Es una heurística de
/// caracteres, independiente del ajuste por píxeles de los nodos
/// activos.
pub fn truncate_label(label: &str, depth: u32) -> String {
    let max_chars = match depth {
        0 => 25,
        1 => 20,
        _ => 15,
    };
    let count = label.chars().count();
    if count <= max_chars {
        label.to_string()
    } else {
        let cut: String = label.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

/// Calcula el tamaño de la caja de un nodo.
///
/// Inactivo: ancho según el texto medido más el relleno, acotado, y
/// alto compacto fijo. Activo: rango de ancho mayor y alto según las
/// líneas ajustadas de etiqueta y descripción más el relleno del botón
/// de ampliar contenido.
pub fn size_box(label: &str, description: Option<&str>, depth: u32, is_active: bool) -> BoxSize {
    if is_active {
        let font = FontSpec::new(12.0, true);
        let width = (measure_text(label, font) * 1.2).clamp(150.0, 250.0);

        let label_lines = wrap_text(label, ACTIVE_WRAP_WIDTH, font).len();
        let desc_lines = description
            .map(|d| wrap_text(d, ACTIVE_WRAP_WIDTH, FontSpec::new(10.0, false)).len())
            .unwrap_or(0);

        let text_height = ((label_lines + desc_lines) as f64 * LINE_HEIGHT + 20.0).max(60.0);
        // +30 para el botón de ampliar contenido.
        BoxSize { width, height: text_height + 30.0 }
    } else {
        let font = FontSpec::new(11.0, depth <= 1);
        BoxSize {
            width: (measure_text(label, font) + 20.0).clamp(30.0, 150.0),
            height: 30.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FONT: FontSpec = FontSpec::new(12.0, false);

    #[test]
    fn ninguna_linea_multi_palabra_supera_el_ancho() {
        let text = "la disposición radial reparte las ramas alrededor del tema central";
        let max_width = 90.0;
        for line in wrap_text(text, max_width, FONT) {
            if line.split_whitespace().count() > 1 {
                assert!(
                    measure_text(&line, FONT) <= max_width,
                    "línea demasiado ancha: {line:?}"
                );
            }
        }
    }

    #[test]
    fn el_ajuste_conserva_la_secuencia_de_palabras() {
        let text = "uno dos tres cuatro cinco seis siete ocho";
        let rejoined = wrap_text(text, 50.0, FONT).join(" ");
        let original: Vec<&str> = text.split_whitespace().collect();
        let wrapped: Vec<&str> = rejoined.split_whitespace().collect();
        assert_eq!(original, wrapped);
    }

    #[test]
    fn texto_vacio_produce_una_linea_vacia() {
        assert_eq!(wrap_text("", 100.0, FONT), vec![String::new()]);
        assert_eq!(wrap_text("   ", 0.0, FONT), vec![String::new()]);
    }

    #[test]
    fn una_palabra_larga_nunca_se_parte() {
        let lines = wrap_text("electroencefalografista corto", 20.0, FONT);
        assert_eq!(lines[0], "electroencefalografista");
        assert_eq!(lines[1], "corto");
    }

    #[test]
    fn ancho_cero_da_una_palabra_por_linea() {
        let lines = wrap_text("a b c", 0.0, FONT);
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn truncado_por_profundidad_con_elipsis() {
        let label = "una etiqueta considerablemente larga para un nodo";
        assert_eq!(truncate_label(label, 0).chars().count(), 25 + 3);
        assert_eq!(truncate_label(label, 1).chars().count(), 20 + 3);
        assert_eq!(truncate_label(label, 4).chars().count(), 15 + 3);
        assert!(truncate_label(label, 2).ends_with("..."));
        // Un texto corto se conserva intacto.
        assert_eq!(truncate_label("corto", 3), "corto");
    }

    #[test]
    fn caja_inactiva_acotada_y_compacta() {
        let tiny = size_box("ab", None, 2, false);
        assert_eq!(tiny.width, 30.0);
        assert_eq!(tiny.height, 30.0);

        let huge = size_box(
            "una etiqueta larguísima que desborda cualquier caja razonable",
            None,
            2,
            false,
        );
        assert_eq!(huge.width, 150.0);
        assert_eq!(huge.height, 30.0);
    }

    #[test]
    fn caja_activa_crece_con_la_descripcion() {
        let sin = size_box("Tema", None, 1, true);
        let con = size_box(
            "Tema",
            Some("una descripción larga que necesita varias líneas para caber en la caja expandida"),
            1,
            true,
        );
        assert!(sin.width >= 150.0 && sin.width <= 250.0);
        assert!(con.height > sin.height);
        // Mínimo 60 de texto más 30 del botón.
        assert!(sin.height >= 90.0);
    }
}
