//! Abstracción sobre Rig para trabajar con distintos proveedores de LLM.
//! De momento se implementa OpenAI; Gemini/Ollama quedan preparados para el futuro.

use crate::config::{AppConfig, LlmProvider};
use crate::models::RawNode;
use anyhow::{anyhow, Result};
use rig::completion::Prompt;
use tracing::warn;

/// Gestor de LLMs: generación del árbol del mapa y del contenido ampliado.
#[derive(Debug, Clone)]
pub struct LlmManager {
    pub provider: LlmProvider,
    pub chat_model: String,
}

impl LlmManager {
    /// Construye el manager a partir de la configuración.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        Ok(Self {
            provider: cfg.llm_provider.clone(),
            chat_model: cfg.llm_chat_model.clone(),
        })
    }

    // ---------------------------------------------------------------------
    // GENERACIÓN DEL MAPA MENTAL
    // ---------------------------------------------------------------------

    /// Pide al LLM un mapa mental sobre `query` y lo devuelve como
    /// árbol crudo sin validar (la normalización es cosa del llamante).
    pub async fn generate_mind_map(&self, query: &str) -> Result<RawNode> {
        match self.provider {
            LlmProvider::OpenAI => self.mind_map_with_openai(query).await,
            ref other => Err(anyhow!(
                "Proveedor LLM {:?} aún no implementado para mapas mentales",
                other
            )),
        }
    }

    async fn mind_map_with_openai(&self, query: &str) -> Result<RawNode> {
        use rig::providers::openai;
        // Trait para client.agent(...)
        use rig::client::CompletionClient as _;

        const MAP_PROMPT: &str = r#"
Tu tarea es crear un mapa mental completo y accesible sobre el tema que te dé el usuario.

PAUTAS IMPORTANTES:
1. Estructura el mapa con un tema central y ramas de profundidad variable (2-4 niveles).
2. No sigas un patrón fijo: la estructura debe adaptarse de forma natural al contenido.
3. Usa frases cortas y claras (3-5 palabras) para facilitar la lectura.
4. Limita las ramas principales a entre 4 y 6 para reducir la carga cognitiva.
5. Los nodos finales (hojas) deben contener información concreta y accionable.

La salida DEBE ser un único objeto JSON válido con esta estructura:
{
  "topic": "Tema central",
  "children": [
    {
      "name": "Rama principal 1",
      "description": "Descripción corta opcional",
      "children": [
        {
          "name": "Subtema 1.1",
          "isLeafNode": false,
          "children": [
            {
              "name": "Detalle 1.1.1",
              "description": "Información concreta",
              "isLeafNode": true,
              "children": []
            }
          ]
        }
      ]
    }
  ]
}

IMPORTANTE: marca los nodos finales con "isLeafNode": true y los que tienen hijos con "isLeafNode": false.
No incluyas explicaciones, solo el JSON.
"#;

        let client = openai::Client::from_env();
        let model_name = if self.chat_model.is_empty() {
            "gpt-4o-mini"
        } else {
            self.chat_model.as_str()
        };

        let agent = client.agent(model_name).preamble(MAP_PROMPT).build();
        let response = agent.prompt(query).await?;
        parse_mind_map_json(&response)
    }

    // ---------------------------------------------------------------------
    // CONTENIDO AMPLIADO DE UN NODO
    // ---------------------------------------------------------------------

    /// Genera el texto ampliado que muestra el panel al expandir un
    /// nodo. Texto libre; el frontend lo parte en párrafos.
    pub async fn generate_topic_content(&self, topic: &str) -> Result<String> {
        match self.provider {
            LlmProvider::OpenAI => self.content_with_openai(topic).await,
            ref other => Err(anyhow!(
                "Proveedor LLM {:?} aún no implementado para contenido ampliado",
                other
            )),
        }
    }

    async fn content_with_openai(&self, topic: &str) -> Result<String> {
        use rig::providers::openai;
        use rig::client::CompletionClient as _;

        const CONTENT_PROMPT: &str = r#"
Eres un divulgador experto. Escribe una explicación clara y concisa del tema
que te dé el usuario, en español, pensada para alguien que está estudiando
un mapa mental sobre ese tema.
Escribe 3 o 4 párrafos cortos separados por líneas en blanco, sin títulos ni
listas, y sin ningún formato Markdown.
"#;

        let client = openai::Client::from_env();
        let model_name = if self.chat_model.is_empty() {
            "gpt-4o-mini"
        } else {
            self.chat_model.as_str()
        };

        let agent = client.agent(model_name).preamble(CONTENT_PROMPT).build();
        let answer = agent.prompt(topic).await?;
        Ok(answer)
    }
}

/// Limpia la respuesta del LLM (vallas de código, texto alrededor) y la
/// parsea como árbol crudo. A diferencia de otros extractores tolerantes,
/// aquí un JSON inválido es un error duro: sin árbol no hay mapa y el
/// usuario debe reenviar la consulta.
pub(crate) fn parse_mind_map_json(response: &str) -> Result<RawNode> {
    let cleaned = response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    // Quedarse con el objeto JSON más externo, por si el modelo añadió
    // texto antes o después.
    let json = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if end >= start => &cleaned[start..=end],
        _ => {
            warn!("La respuesta del LLM no contiene ningún objeto JSON: '{response}'");
            return Err(anyhow!("El LLM no devolvió un mapa mental válido"));
        }
    };

    match serde_json::from_str::<RawNode>(json) {
        Ok(raw) => Ok(raw),
        Err(e) => {
            warn!("No se pudo parsear el JSON del mapa mental. Error: {e}. Respuesta LLM: '{response}'");
            Err(anyhow!("El LLM devolvió un mapa mental con formato inválido"))
        }
    }
}
