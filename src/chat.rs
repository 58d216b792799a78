//! Respondedor de chat de demostración para el panel de contenido.
//!
//! Clasifica la pregunta por palabras clave y rellena una plantilla
//! prefijada con el tema del nodo activo. Es un sustituto deliberado:
//! en producción se cambiaría por una llamada real al LLM detrás de la
//! misma interfaz `(pregunta, tema) -> respuesta`.

/// Genera una respuesta prefijada a partir de la pregunta del usuario
/// y el tema del nodo activo. Función pura y síncrona.
pub fn generate_chat_response(question: &str, topic: &str) -> String {
    let q = question.to_lowercase();

    if contains_any(&q, &["explica", "qué es", "que es", "explain", "what is"]) {
        return format!(
            "{topic} es un concepto clave dentro de este mapa: organiza la información \
             en una estructura visual que hace evidentes las conexiones entre ideas. \
             Entenderlo ayuda a situar el resto de las ramas en contexto."
        );
    }

    if contains_any(&q, &["beneficio", "ventaja", "benefit", "advantage"]) {
        return format!(
            "Entre los beneficios de {topic} destacan: 1) ordena ideas complejas en \
             partes manejables, 2) facilita recordar la información importante, \
             3) ayuda a planificar y a resolver problemas de forma sistemática."
        );
    }

    if contains_any(
        &q,
        &["desventaja", "inconveniente", "problema", "riesgo", "drawback", "challenge"],
    ) {
        return format!(
            "Las limitaciones de {topic} que conviene tener en cuenta son: la \
             simplificación excesiva de temas con muchos matices, la dependencia de \
             una buena estructura inicial y el esfuerzo de mantenerlo actualizado."
        );
    }

    if contains_any(&q, &["futuro", "tendencia", "future", "trend"]) {
        return format!(
            "Las tendencias en torno a {topic} apuntan a una integración cada vez \
             mayor con herramientas digitales y asistentes de IA, con estructuras \
             generadas y refinadas automáticamente a partir del contenido."
        );
    }

    format!(
        "Tu pregunta sobre {topic} toca un punto interesante. En general, {topic} \
         tiene relevancia en varios ámbitos: su aplicación práctica, su papel en el \
         aprendizaje y su uso para resolver problemas. Puedes preguntarme por sus \
         beneficios, sus inconvenientes o su futuro."
    )
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}
