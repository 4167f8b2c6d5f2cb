use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tracing::debug;
use tracing::warn;

use super::Transport;
use crate::ComponentRef;
use crate::Result;
use crate::TransportError;

/// Request emitted by [`ChannelTransport`] for the host to serve
#[derive(Debug)]
pub enum TransportRequest {
    Commit {
        component: ComponentRef,
        reply: oneshot::Sender<Result<()>>,
    },
    Call {
        component: ComponentRef,
        method: String,
        params: Vec<Value>,
        reply: oneshot::Sender<Result<Value>>,
    },
}

impl TransportRequest {
    pub fn component(&self) -> &ComponentRef {
        match self {
            TransportRequest::Commit { component, .. } => component,
            TransportRequest::Call { component, .. } => component,
        }
    }
}

/// Transport bridge over a bounded tokio channel
///
/// Each commit/call becomes a [`TransportRequest`] carrying a oneshot reply
/// sender; the caller's future completes once the host answers. Request
/// coalescing and ordering are left to the host.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    requests: mpsc::Sender<TransportRequest>,
}

impl ChannelTransport {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<TransportRequest>) {
        let (requests, rx) = mpsc::channel(buffer.max(1));
        (Self { requests }, rx)
    }

    async fn send(
        &self,
        request: TransportRequest,
    ) -> Result<()> {
        self.requests.send(request).await.map_err(|e| {
            warn!(component = %e.0.component().id(), "transport channel closed");
            TransportError::ChannelClosed.into()
        })
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn request_commit(
        &self,
        component: ComponentRef,
    ) -> Result<()> {
        debug!(component = %component.id(), "commit requested");
        let (reply, rx) = oneshot::channel();
        self.send(TransportRequest::Commit { component, reply }).await?;
        rx.await.map_err(|_| TransportError::ReplyDropped)?
    }

    async fn request_call(
        &self,
        component: ComponentRef,
        method: String,
        params: Vec<Value>,
    ) -> Result<Value> {
        debug!(component = %component.id(), method = %method, "call requested");
        let (reply, rx) = oneshot::channel();
        self.send(TransportRequest::Call {
            component,
            method,
            params,
            reply,
        })
        .await?;
        rx.await.map_err(|_| TransportError::ReplyDropped)?
    }
}
