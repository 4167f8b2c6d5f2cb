use serde_json::json;

use super::*;
use crate::reactive::Reactivity;
use crate::Component;
use crate::Error;
use crate::TransportError;

fn component() -> ComponentRef {
    Component::builder("form").id("form-1").build(&Reactivity::default())
}

#[tokio::test]
async fn commit_is_forwarded_and_answered() {
    let (transport, mut requests) = ChannelTransport::new(4);

    let host = tokio::spawn(async move {
        match requests.recv().await {
            Some(TransportRequest::Commit { component, reply }) => {
                assert_eq!(component.id().as_str(), "form-1");
                reply.send(Ok(())).unwrap();
            }
            other => panic!("unexpected request: {other:?}"),
        }
    });

    transport.request_commit(component()).await.unwrap();
    host.await.unwrap();
}

#[tokio::test]
async fn call_carries_method_and_params() {
    let (transport, mut requests) = ChannelTransport::new(4);

    let host = tokio::spawn(async move {
        match requests.recv().await {
            Some(TransportRequest::Call {
                method, params, reply, ..
            }) => {
                assert_eq!(method, "save");
                assert_eq!(params, vec![json!(1), json!("a")]);
                reply.send(Ok(json!({ "saved": true }))).unwrap();
            }
            other => panic!("unexpected request: {other:?}"),
        }
    });

    let value = transport
        .request_call(component(), "save".to_string(), vec![json!(1), json!("a")])
        .await
        .unwrap();

    assert_eq!(value, json!({ "saved": true }));
    host.await.unwrap();
}

#[tokio::test]
async fn host_errors_are_returned_untouched() {
    let (transport, mut requests) = ChannelTransport::new(1);

    tokio::spawn(async move {
        if let Some(TransportRequest::Commit { reply, .. }) = requests.recv().await {
            let _ = reply.send(Err(TransportError::CommitFailed {
                component: "form-1".into(),
                reason: "validation".into(),
            }
            .into()));
        }
    });

    let err = transport.request_commit(component()).await.unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::CommitFailed { .. })));
}

#[tokio::test]
async fn closed_channel_fails_the_request() {
    let (transport, requests) = ChannelTransport::new(1);
    drop(requests);

    let err = transport.request_commit(component()).await.unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::ChannelClosed)));
}

#[tokio::test]
async fn dropped_reply_fails_the_request() {
    let (transport, mut requests) = ChannelTransport::new(1);

    tokio::spawn(async move {
        let request = requests.recv().await;
        drop(request);
    });

    let err = transport
        .request_call(component(), "noop".to_string(), vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::ReplyDropped)));
}

#[tokio::test]
async fn unavailable_services_report_their_name() {
    let err = Unavailable.request_commit(component()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Dispatch(crate::DispatchError::ServiceUnavailable { service: "transport" })
    ));

    assert!(Unavailable.closest_component(NodeId(1)).is_none());
    assert!(Unavailable.entangle(component(), "x".into(), false).is_err());
}
