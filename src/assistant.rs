//! Board assistant: a prompt built from a snapshot of the board, forwarded in
//! a single completion request to a hosted generative-language endpoint.

use std::time::Duration;

use serde_json::{Value, json};

use crate::config::LlmConfig;
use crate::errors::AppError;
use crate::models::stage::Priority;
use crate::models::stalled::StalledTask;
use crate::models::stats::BoardStats;
use crate::models::task::Task;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_QUESTION_LEN: usize = 1000;
/// At most this many OPs are listed per section of the prompt.
const MAX_LISTED: usize = 10;

/// Build the prompt for one user turn.
pub fn build_prompt(question: &str, stats: &BoardStats, stalled: &[StalledTask], tasks: &[Task]) -> String {
    let mut prompt = String::from(
        "Sos el asistente de producción de una imprenta y taller de cartelería. \
         Respondé en español, de forma breve y concreta, usando solo los datos del tablero.\n\n",
    );

    prompt.push_str(&format!(
        "Tablero: {} OPs ({} abiertas, {} entregadas, {} sin responsable). Avance promedio {:.0}%.\n",
        stats.total, stats.open, stats.delivered, stats.unassigned_open, stats.average_progress
    ));

    prompt.push_str("OPs por etapa:\n");
    for s in stats.per_stage.iter().filter(|s| s.count > 0) {
        prompt.push_str(&format!("- {}: {}\n", s.label, s.count));
    }

    prompt.push_str("Carga por persona:\n");
    for m in &stats.per_member {
        prompt.push_str(&format!("- {}: {} abiertas, {} entregadas\n", m.name, m.open, m.delivered));
    }

    if !stalled.is_empty() {
        prompt.push_str("OPs estancadas:\n");
        for s in stalled.iter().take(MAX_LISTED) {
            prompt.push_str(&format!(
                "- OP {} ({}) en {} hace {}, responsable {}\n",
                s.task.op_number,
                s.task.title,
                s.task.status.label(),
                s.idle_label(),
                s.task.owner_label()
            ));
        }
    }

    let urgent: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.priority == Priority::Alta && !t.status.is_terminal())
        .take(MAX_LISTED)
        .collect();
    if !urgent.is_empty() {
        prompt.push_str("OPs de prioridad alta abiertas:\n");
        for t in urgent {
            prompt.push_str(&format!(
                "- OP {} ({}) en {}, vence {}\n",
                t.op_number,
                t.title,
                t.status.label(),
                if t.due_date.is_some() { t.due_label() } else { "sin fecha".to_string() }
            ));
        }
    }

    prompt.push_str("\nPregunta: ");
    prompt.push_str(question.trim());
    prompt
}

pub fn validate_question(question: &str) -> Result<(), AppError> {
    let q = question.trim();
    if q.is_empty() {
        return Err(AppError::Validation("Question is required".into()));
    }
    if q.chars().count() > MAX_QUESTION_LEN {
        return Err(AppError::Validation(format!("Question must be at most {MAX_QUESTION_LEN} characters")));
    }
    Ok(())
}

/// Request body in the `generateContent` shape.
pub fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
    })
}

/// Pull the answer text out of a `generateContent` response.
pub fn extract_answer(response: &Value) -> Option<String> {
    let parts = response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() { None } else { Some(text) }
}

/// Send one completion request. No retry.
pub async fn complete(config: Option<&LlmConfig>, prompt: &str) -> Result<String, AppError> {
    let config = config
        .cloned()
        .ok_or_else(|| AppError::Validation("Assistant not configured".into()))?;
    let body = request_body(prompt);

    let response = actix_web::web::block(move || post_blocking(&config, &body))
        .await
        .map_err(|e| AppError::Remote(e.to_string()))??;

    extract_answer(&response).ok_or_else(|| AppError::Remote("LLM response had no text".into()))
}

fn post_blocking(config: &LlmConfig, body: &Value) -> Result<Value, AppError> {
    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build();

    let response = agent
        .post(&config.url)
        .set("x-goog-api-key", &config.api_key)
        .send_json(body)
        .map_err(|e| match e {
            ureq::Error::Status(code, _) => AppError::Remote(format!("LLM endpoint returned {code}")),
            other => AppError::Remote(other.to_string()),
        })?;

    response
        .into_json::<Value>()
        .map_err(|e| AppError::Remote(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stage::Stage;
    use crate::models::stalled;
    use crate::models::stats::compute;
    use crate::models::testutil::{member, task};
    use chrono::Duration as ChronoDuration;

    #[test]
    fn prompt_contains_snapshot_and_question() {
        let mut urgent = task(1, Stage::Diseno, Some(1));
        urgent.priority = Priority::Alta;
        let tasks = vec![urgent, task(2, Stage::Entrega, Some(1))];
        let stats = compute(&tasks, &[member(1, "Ana")]);
        let now = tasks[0].updated_at + ChronoDuration::hours(60);
        let stalled = stalled::detect(&tasks, now, 48);
        let prompt = build_prompt("  ¿Qué atraso hay? ", &stats, &stalled, &tasks);

        assert!(prompt.contains("2 OPs (1 abiertas, 1 entregadas"));
        assert!(prompt.contains("- Diseño: 1"));
        assert!(prompt.contains("- Ana: 1 abiertas, 1 entregadas"));
        assert!(prompt.contains("OPs estancadas:\n- OP OP-0001"));
        assert!(prompt.contains("vence sin fecha"));
        assert!(prompt.ends_with("Pregunta: ¿Qué atraso hay?"));
    }

    #[test]
    fn answer_is_joined_from_parts() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hola " }, { "text": "equipo" }] } }]
        });
        assert_eq!(extract_answer(&response).as_deref(), Some("Hola equipo"));
        assert_eq!(extract_answer(&json!({ "candidates": [] })), None);
    }

    #[test]
    fn question_validation() {
        assert!(validate_question("   ").is_err());
        assert!(validate_question(&"x".repeat(1001)).is_err());
        assert!(validate_question("¿Cuántas OPs hay?").is_ok());
    }

    #[actix_web::test]
    async fn missing_config_is_a_validation_error() {
        let err = complete(None, "hola").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
