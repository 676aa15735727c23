use std::collections::HashMap;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::ServiceError;
use crate::dispatch::Scope;
use crate::types::{TenantId, UserId};

/// Identity a socket was upgraded with. Fixed for the connection lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientInfo {
    pub tenant: TenantId,
    pub user: UserId,
    pub connected_at: DateTime<Utc>,
}

impl ClientInfo {
    pub fn new(tenant: TenantId, user: UserId) -> Self {
        Self {
            tenant,
            user,
            connected_at: Utc::now(),
        }
    }
}

/// Push event delivered to every client of one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub tenant_id: TenantId,
    pub user_id: Option<UserId>,
    pub data: Value,
}

impl HubMessage {
    pub fn new(kind: impl Into<String>, tenant: TenantId, user: Option<UserId>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            tenant_id: tenant,
            user_id: user,
            data,
        }
    }
}

/// What a client may send. Tenant and user are stamped by the hub from the
/// connection identity, never taken from the frame.
#[derive(Debug, Deserialize)]
struct ClientFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubStats {
    pub total_connections: u64,
    pub tenant_connections: u64,
}

/// Long-lived owner of upgraded websocket connections.
#[async_trait]
pub trait PushHub: Send + Sync {
    /// Take ownership of an upgraded socket and run its read/write loops
    /// until the peer goes away.
    async fn attach(&self, socket: WebSocket, client: ClientInfo);

    /// Deliver to every connection of `tenant`; returns the recipient count.
    async fn broadcast(&self, tenant: &TenantId, message: HubMessage) -> usize;

    async fn stats(&self, scope: &Scope, tenant: &TenantId) -> Result<HubStats, ServiceError>;
}

struct Connection {
    info: ClientInfo,
    outbox: mpsc::UnboundedSender<HubMessage>,
}

/// Tenant-scoped broadcast hub held in process memory.
#[derive(Default)]
pub struct MemoryHub {
    connections: RwLock<HashMap<Uuid, Connection>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn connect(&self, info: ClientInfo) -> (Uuid, mpsc::UnboundedReceiver<HubMessage>) {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.connections.write().await.insert(id, Connection { info, outbox });
        (id, inbox)
    }

    pub(crate) async fn disconnect(&self, id: Uuid) {
        self.connections.write().await.remove(&id);
    }

    async fn send_to(&self, id: Uuid, message: HubMessage) {
        if let Some(conn) = self.connections.read().await.get(&id) {
            let _ = conn.outbox.send(message);
        }
    }

    async fn handle_frame(&self, id: Uuid, client: &ClientInfo, text: &str) {
        let frame = match serde_json::from_str::<ClientFrame>(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(error = %e, tenant = %client.tenant, "ignoring malformed websocket frame");
                return;
            }
        };

        if frame.kind == "ping" {
            let pong = HubMessage::new("pong", client.tenant.clone(), Some(client.user), Value::Null);
            self.send_to(id, pong).await;
            return;
        }

        let message = HubMessage::new(frame.kind, client.tenant.clone(), Some(client.user), frame.data);
        self.broadcast(&client.tenant, message).await;
    }
}

#[async_trait]
impl PushHub for MemoryHub {
    async fn attach(&self, socket: WebSocket, client: ClientInfo) {
        let (id, mut inbox) = self.connect(client.clone()).await;
        tracing::info!(tenant = %client.tenant, user = client.user.0, connection = %id, "websocket connected");

        let (mut sink, mut stream) = socket.split();

        let mut send_task = tokio::spawn(async move {
            while let Some(message) = inbox.recv().await {
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to encode hub message");
                        continue;
                    }
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        });

        let recv_loop = async {
            while let Some(Ok(frame)) = stream.next().await {
                match frame {
                    Message::Text(text) => self.handle_frame(id, &client, &text).await,
                    Message::Close(_) => break,
                    // Ping/pong are answered by axum
                    _ => {}
                }
            }
        };

        tokio::select! {
            _ = &mut send_task => {}
            _ = recv_loop => send_task.abort(),
        }

        self.disconnect(id).await;
        tracing::info!(tenant = %client.tenant, user = client.user.0, connection = %id, "websocket disconnected");
    }

    async fn broadcast(&self, tenant: &TenantId, message: HubMessage) -> usize {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|conn| &conn.info.tenant == tenant)
            .filter(|conn| conn.outbox.send(message.clone()).is_ok())
            .count()
    }

    async fn stats(&self, _scope: &Scope, tenant: &TenantId) -> Result<HubStats, ServiceError> {
        let connections = self.connections.read().await;
        let tenant_connections = connections.values().filter(|conn| &conn.info.tenant == tenant).count();
        Ok(HubStats {
            total_connections: connections.len() as u64,
            tenant_connections: tenant_connections as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tenant(id: &str) -> TenantId {
        TenantId::new(id).unwrap()
    }

    #[tokio::test]
    async fn broadcast_stays_within_tenant() {
        let hub = MemoryHub::new();
        let (_, mut a) = hub.connect(ClientInfo::new(tenant("t1"), UserId(1))).await;
        let (_, mut b) = hub.connect(ClientInfo::new(tenant("t2"), UserId(2))).await;

        let delivered = hub
            .broadcast(&tenant("t1"), HubMessage::new("lead_scored_hot", tenant("t1"), None, json!({"lead_id": 5})))
            .await;

        assert_eq!(delivered, 1);
        assert_eq!(a.recv().await.unwrap().kind, "lead_scored_hot");
        assert!(b.try_recv().is_err());
    }

    #[tokio::test]
    async fn client_frames_are_stamped_with_connection_identity() {
        let hub = MemoryHub::new();
        let client = ClientInfo::new(tenant("t1"), UserId(42));
        let (id, mut inbox) = hub.connect(client.clone()).await;

        hub.handle_frame(id, &client, r#"{"type":"typing","tenant_id":"t2","data":{"x":1}}"#).await;
        let message = inbox.recv().await.unwrap();
        assert_eq!(message.tenant_id, tenant("t1"));
        assert_eq!(message.user_id, Some(UserId(42)));
        assert_eq!(message.data, json!({"x": 1}));

        hub.handle_frame(id, &client, r#"{"type":"ping"}"#).await;
        assert_eq!(inbox.recv().await.unwrap().kind, "pong");
    }

    #[tokio::test]
    async fn stats_count_connections() {
        let hub = MemoryHub::new();
        let (first, _a) = hub.connect(ClientInfo::new(tenant("t1"), UserId(1))).await;
        let (_, _b) = hub.connect(ClientInfo::new(tenant("t1"), UserId(2))).await;
        let (_, _c) = hub.connect(ClientInfo::new(tenant("t2"), UserId(3))).await;

        let stats = hub.stats(&Scope::detached(), &tenant("t1")).await.unwrap();
        assert_eq!(stats, HubStats { total_connections: 3, tenant_connections: 2 });

        hub.disconnect(first).await;
        let stats = hub.stats(&Scope::detached(), &tenant("t1")).await.unwrap();
        assert_eq!(stats.tenant_connections, 1);
    }
}
