use std::convert::Infallible;

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::chat::parser::{FenceScanner, UiComponent};
use crate::chat::{ChatClient, Conversation, WireMessage};

#[derive(Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<WireMessage>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/chat", web::post().to(chat_completion));
}

fn sse_event(value: serde_json::Value) -> web::Bytes {
    web::Bytes::from(format!("data: {}\n\n", value))
}

/// Relays one conversation exchange to the model backend and streams the
/// reply back as server-sent events: a `content` record per text delta, a
/// `component` record when a fenced block completes, an `error` record if
/// the exchange fails.
async fn chat_completion(
    client: web::Data<ChatClient>,
    payload: web::Json<ChatRequest>,
) -> HttpResponse {
    let request = payload.into_inner();

    let submission = match request.messages.last() {
        Some(last) if last.role == "user" => last.content.clone(),
        _ => {
            return HttpResponse::BadRequest().json(json!({
                "message": "The last message must be a user turn"
            }))
        }
    };
    let prior = &request.messages[..request.messages.len() - 1];
    let mut conversation = Conversation::from_history(prior);

    if let Err(e) = conversation.submit(&submission) {
        return HttpResponse::BadRequest().json(json!({ "message": e.to_string() }));
    }

    let client = client.into_inner();
    let event_stream = async_stream::stream! {
        let cancel = CancellationToken::new();

        let mut upstream = match client.open_stream(&conversation.outbound(), cancel.clone()).await {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("Chat stream failed to open: {}", e);
                let description = e.to_string();
                conversation.fail(&description);
                yield Ok::<_, Infallible>(sse_event(json!({ "error": description })));
                return;
            }
        };

        let mut scanner = FenceScanner::new();
        loop {
            match upstream.next_content().await {
                Ok(Some(delta)) => {
                    conversation.apply_content(&delta);
                    for component in scanner.push(&delta) {
                        conversation.attach_component(component.clone());
                        yield Ok(component_event(&component));
                    }
                    yield Ok(sse_event(json!({ "content": delta })));
                }
                Ok(None) => {
                    for component in scanner.finish() {
                        conversation.attach_component(component.clone());
                        yield Ok(component_event(&component));
                    }
                    conversation.complete();
                    break;
                }
                Err(e) => {
                    log::error!("Chat stream error: {}", e);
                    let description = e.to_string();
                    conversation.fail(&description);
                    yield Ok(sse_event(json!({ "error": description })));
                    break;
                }
            }
        }
    };

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .streaming(event_stream)
}

fn component_event(component: &UiComponent) -> web::Bytes {
    sse_event(json!({ "component": component }))
}
