use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::DeliveryPolicy;
use crate::conversation::MessageId;
use crate::events::AppEvent;
use crate::webhook::WebhookClient;

/// A user message waiting for its webhook round trip
#[derive(Debug)]
struct Job {
    in_reply_to: MessageId,
    text: String,
}

enum Route {
    Concurrent(Arc<WebhookClient>),
    Serialized(mpsc::UnboundedSender<Job>),
}

/// Runs webhook round trips off the UI loop and reports each resolved reply
/// back as an [`AppEvent::BotReply`].
///
/// Must be created inside a tokio runtime.
pub struct SubmissionDispatcher {
    route: Route,
    events: mpsc::UnboundedSender<AppEvent>,
    session_id: String,
}

impl SubmissionDispatcher {
    pub fn new(
        client: WebhookClient,
        policy: DeliveryPolicy,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let session_id = client.session_id().to_string();
        let route = match policy {
            DeliveryPolicy::Concurrent => Route::Concurrent(Arc::new(client)),
            DeliveryPolicy::Serialized => {
                let (tx, rx) = mpsc::unbounded_channel();
                tokio::spawn(serial_worker(client, rx, events.clone()));
                Route::Serialized(tx)
            }
        };

        Self {
            route,
            events,
            session_id,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Start the round trip for an already-appended user message
    pub fn submit(&self, in_reply_to: MessageId, text: String) {
        let job = Job { in_reply_to, text };

        match &self.route {
            Route::Concurrent(client) => {
                let client = client.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let reply = client.send_message(&job.text).await;
                    let _ = events.send(AppEvent::BotReply {
                        in_reply_to: job.in_reply_to,
                        text: reply,
                    });
                });
            }
            Route::Serialized(queue) => {
                if queue.send(job).is_err() {
                    tracing::error!("Submission worker has stopped; message dropped");
                }
            }
        }
    }
}

async fn serial_worker(
    client: WebhookClient,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    events: mpsc::UnboundedSender<AppEvent>,
) {
    while let Some(job) = jobs.recv().await {
        let reply = client.send_message(&job.text).await;
        if events
            .send(AppEvent::BotReply {
                in_reply_to: job.in_reply_to,
                text: reply,
            })
            .is_err()
        {
            break;
        }
    }
    tracing::debug!("Submission worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationStore;
    use crate::events::Sender;
    use crate::session::SessionId;
    use crate::testing::{Canned, TestWebhook, direct_client};
    use std::time::Duration;

    /// The first message is answered slowly, everything else immediately.
    async fn slow_first_server() -> TestWebhook {
        TestWebhook::with_responder(|body| {
            let request: serde_json::Value = serde_json::from_str(body).unwrap();
            let text = request["message"].as_str().unwrap_or_default().to_string();
            let canned = Canned::ok(&format!("{{\"output\":\"re: {}\"}}", text));
            if text == "first" {
                canned.after(Duration::from_millis(300))
            } else {
                canned
            }
        })
        .await
    }

    async fn run(policy: DeliveryPolicy) -> Vec<(MessageId, String)> {
        let server = slow_first_server().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = SubmissionDispatcher::new(
            direct_client(&server.url(), SessionId::generate()),
            policy,
            tx,
        );

        let mut store = ConversationStore::new();
        for text in ["first", "second"] {
            let id = store.append_message(Sender::User, text.to_string()).id;
            dispatcher.submit(id, text.to_string());
        }

        let mut replies = Vec::new();
        while replies.len() < 2 {
            match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
                Ok(Some(AppEvent::BotReply { in_reply_to, text })) => replies.push((in_reply_to, text)),
                Ok(Some(_)) => {}
                other => panic!("no reply received (timed out: {})", other.is_err()),
            }
        }
        server.shutdown().await;
        replies
    }

    #[tokio::test]
    async fn concurrent_replies_arrive_in_completion_order() {
        let replies = run(DeliveryPolicy::Concurrent).await;
        let texts: Vec<&str> = replies.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(texts, vec!["re: second", "re: first"]);
    }

    #[tokio::test]
    async fn serialized_replies_arrive_in_submission_order() {
        let replies = run(DeliveryPolicy::Serialized).await;
        let texts: Vec<&str> = replies.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(texts, vec!["re: first", "re: second"]);
        assert!(replies[0].0 < replies[1].0);
    }

    #[tokio::test]
    async fn session_id_is_shared_by_every_request() {
        let server = TestWebhook::start(Canned::ok("ok")).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = SubmissionDispatcher::new(
            direct_client(&server.url(), SessionId::generate()),
            DeliveryPolicy::Concurrent,
            tx,
        );

        let mut store = ConversationStore::new();
        for text in ["a", "b", "c"] {
            let id = store.append_message(Sender::User, text.to_string()).id;
            dispatcher.submit(id, text.to_string());
        }
        for _ in 0..3 {
            tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        }

        let sessions: Vec<String> = server
            .requests()
            .iter()
            .map(|body| {
                let value: serde_json::Value = serde_json::from_str(body).unwrap();
                value["sessionId"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(sessions.len(), 3);
        assert!(sessions.iter().all(|s| s == dispatcher.session_id()));
        server.shutdown().await;
    }
}
