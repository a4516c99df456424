//! Full-stack tests: two hubs talking over real TCP sockets.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::timeout;
use varwire_codec::Value;
use varwire_rpc::{
    arg, require_args, CallFuture, CallResult, Proxy, RemoteError, RpcHub, VarCallable,
};
use varwire_transport::{drive, MessageRouter};

struct Calculator;

impl VarCallable for Calculator {
    fn call(&mut self, method: &str, args: &[Value]) -> CallResult<Value> {
        match method {
            "sum" => {
                require_args(method, args, 1)?;
                let items: Vec<i64> = arg(args, 0)?;
                Ok(Value::Int64(items.iter().sum()))
            }
            _ => Err(RemoteError::NoSuchMethod {
                method: method.to_string(),
            }),
        }
    }
}

struct Node {
    hub: Arc<Mutex<RpcHub>>,
    router: MessageRouter,
}

async fn spawn_node(name: &str) -> Node {
    let (router, events) = MessageRouter::new(name);
    let hub = Arc::new(Mutex::new(RpcHub::new(name, Box::new(router.sender()))));
    tokio::spawn(drive(hub.clone(), events));
    Node { hub, router }
}

async fn connected_nodes() -> (Node, Node) {
    let alpha = spawn_node("alpha").await;
    let beta = spawn_node("beta").await;
    beta.hub
        .lock()
        .unwrap()
        .register_servant(b"calc".to_vec(), Box::new(Calculator));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let acceptor = beta.router.clone();
    tokio::spawn(async move {
        let _ = acceptor.listen(listener).await;
    });
    let peer = alpha.router.connect(&addr.to_string()).await.unwrap();
    assert_eq!(peer, "beta");
    (alpha, beta)
}

async fn await_result(future: &CallFuture<Value>) -> CallResult<Value> {
    let (tx, rx) = oneshot::channel();
    future
        .then(move |result| {
            let _ = tx.send(result);
        })
        .unwrap();
    timeout(Duration::from_secs(5), rx)
        .await
        .expect("call should complete within the timeout")
        .expect("resolver should not be dropped")
}

fn sum_args(items: Vec<i64>) -> Vec<Value> {
    vec![Value::Sequence(items.into_iter().map(Value::Int64).collect())]
}

#[tokio::test]
async fn test_call_across_tcp() {
    let (alpha, _beta) = connected_nodes().await;
    let proxy = Proxy::new(alpha.hub.clone(), "beta", b"calc".to_vec());
    let future = proxy.call("sum", sum_args(vec![1, 3, 5]));
    assert_eq!(await_result(&future).await, Ok(Value::Int64(9)));
}

#[tokio::test]
async fn test_remote_errors_cross_tcp() {
    let (alpha, _beta) = connected_nodes().await;
    let proxy = Proxy::new(alpha.hub.clone(), "beta", b"calc".to_vec());

    let future = proxy.call("sum", vec![]);
    assert_eq!(
        await_result(&future).await,
        Err(RemoteError::NotEnoughArgs {
            method: "sum".to_string(),
            provided: 0,
            required: 1,
        })
    );

    let future = proxy.call("frobnicate", vec![]);
    assert_eq!(
        await_result(&future).await,
        Err(RemoteError::NoSuchMethod {
            method: "frobnicate".to_string(),
        })
    );
}

#[tokio::test]
async fn test_many_interleaved_calls() {
    let (alpha, _beta) = connected_nodes().await;
    let proxy = Proxy::new(alpha.hub.clone(), "beta", b"calc".to_vec());
    let futures: Vec<_> = (0..25)
        .map(|i| proxy.call("sum", sum_args(vec![i, 1000])))
        .collect();
    for (i, future) in futures.iter().enumerate() {
        assert_eq!(
            await_result(future).await,
            Ok(Value::Int64(i as i64 + 1000))
        );
    }
}

#[tokio::test]
async fn test_disconnect_resolves_pending_calls_offline() {
    let alpha = spawn_node("alpha").await;
    // Beta accepts connections but never answers: its events are
    // dropped instead of driven into a hub.
    let (beta_router, _beta_events) = MessageRouter::new("beta");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let acceptor = beta_router.clone();
    tokio::spawn(async move {
        let _ = acceptor.listen(listener).await;
    });
    alpha.router.connect(&addr.to_string()).await.unwrap();

    let proxy = Proxy::new(alpha.hub.clone(), "beta", b"calc".to_vec());
    let future = proxy.call("sum", sum_args(vec![1]));
    assert!(!future.is_resolved());

    alpha.router.disconnect("beta");
    assert!(matches!(
        await_result(&future).await,
        Err(RemoteError::NodeOffline { .. })
    ));
    assert_eq!(alpha.hub.lock().unwrap().pending_count(), 0);
}

#[tokio::test]
async fn test_call_to_unconnected_node_fails_immediately() {
    let alpha = spawn_node("alpha").await;
    let proxy = Proxy::new(alpha.hub.clone(), "gamma", b"calc".to_vec());
    let future = proxy.call("sum", sum_args(vec![1]));
    assert!(matches!(
        future.get().unwrap(),
        Err(RemoteError::NodeOffline { .. })
    ));
}
