use {
    tokio_stream::StreamExt,
    tracing::{debug, warn},
};

use {
    parley_providers::{StreamEvent, TextProvider, model},
    parley_sessions::{Role, SessionStore},
};

use crate::error::GatewayError;

/// Appended to every stored user turn. Prompt cosmetics only.
pub const FORMATTING_SUFFIX: &str = "\n\nPlease structure the answer for readability: use \
paragraphs, lists, emphasis, emoji where appropriate, and tables for complex data. Avoid long \
walls of text; format code as code blocks, enumerations as bulleted or numbered lists, and add \
headings where they help.";

/// Returned (but never stored) when the model reply arrives empty.
pub const EMPTY_REPLY_FALLBACK: &str = "No reply from the model.";

/// Run one chat exchange: store the user turn, call upstream, store and
/// return the buffered reply.
///
/// The first stored turn of a session goes upstream as the bare question —
/// no formatting suffix and no history. Every later turn sends the entire
/// stored history, suffix included. Intentional asymmetry, kept as the
/// observed behavior of this endpoint.
pub async fn ask(
    sessions: &SessionStore,
    provider: &dyn TextProvider,
    session_id: &str,
    question: &str,
) -> Result<String, GatewayError> {
    sessions.get_or_create(session_id).await;
    sessions.touch(session_id).await;
    sessions
        .append_turn(session_id, Role::User, format!("{question}{FORMATTING_SUFFIX}"))
        .await;

    let history = sessions.history(session_id).await;
    debug!(
        session = session_id,
        history_len = history.len(),
        "sending question upstream"
    );

    let contents = if history.len() == 1 {
        vec![model::content("user", question)]
    } else {
        history
            .iter()
            .map(|t| model::content(role_name(t.role), &t.text))
            .collect()
    };

    let reply = drain_stream(provider, contents).await.map_err(|e| {
        warn!(session = session_id, error = %e, "upstream call failed");
        e
    })?;
    sessions
        .append_turn(session_id, Role::Model, reply.clone())
        .await;

    // The empty reply is what got stored; the fallback only ever reaches
    // the caller.
    if reply.is_empty() {
        return Ok(EMPTY_REPLY_FALLBACK.to_string());
    }
    Ok(reply)
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "model",
    }
}

/// Drain the upstream stream to completion, concatenating fragments. A
/// failure at any point discards fragments already received.
async fn drain_stream(
    provider: &dyn TextProvider,
    contents: Vec<serde_json::Value>,
) -> Result<String, GatewayError> {
    let mut stream = provider.stream(contents);
    let mut reply = String::new();
    while let Some(event) = stream.next().await {
        match event {
            StreamEvent::Delta(delta) => reply.push_str(&delta),
            StreamEvent::Done => break,
            StreamEvent::Error(msg) => return Err(GatewayError::Upstream(msg)),
        }
    }
    Ok(reply)
}
