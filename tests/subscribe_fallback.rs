use {
    ckgen::session::{self, UpstreamSession},
    serde_json::Value,
    std::time::Duration,
    stratum::{Connection, LineEvent, Message},
    tokio::net::TcpListener,
};

async fn read_request(conn: &mut Connection) -> (Value, String, Value) {
    match conn.read_line(Duration::from_secs(5)).await.unwrap() {
        LineEvent::Line(line) => match Message::decode(&line).unwrap() {
            Message::Request { id, method, params } => (id.unwrap(), method, params),
            other => panic!("expected a request, got {other:?}"),
        },
        other => panic!("expected a line, got {other:?}"),
    }
}

async fn respond(conn: &mut Connection, id: Value, result: Value, error: Option<Value>) {
    let response = Message::Response { id, result, error };
    conn.write_line(&response.encode().unwrap()).await.unwrap();
}

async fn reject_subscribe(listener: &TcpListener) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut conn = Connection::from_stream(stream);
    let (id, method, _) = read_request(&mut conn).await;
    assert_eq!(method, "mining.subscribe");
    respond(&mut conn, id, Value::Null, Some(serde_json::json!("unsupported params"))).await;
}

async fn accept_subscribe_and_authorize(listener: &TcpListener) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut conn = Connection::from_stream(stream);

    let (id, method, _) = read_request(&mut conn).await;
    assert_eq!(method, "mining.subscribe");
    respond(
        &mut conn,
        id,
        serde_json::json!([[["mining.notify", "sub1"]], "deadbeef", 4]),
        None,
    )
    .await;

    let (auth_id, auth_method, _) = read_request(&mut conn).await;
    assert_eq!(auth_method, "mining.authorize");
    respond(&mut conn, auth_id, Value::Bool(true), None).await;
}

/// A brand-new session has no session id yet, so the ladder starts at the
/// client-tag-only tier; a rejection there falls straight through to the
/// empty-params tier.
#[tokio::test(start_paused = true)]
async fn fresh_session_falls_back_from_client_tag_to_empty_params() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let pool = tokio::spawn(async move {
        reject_subscribe(&listener).await;
        accept_subscribe_and_authorize(&listener).await;
    });

    let session = UpstreamSession::new(
        "bc1qexample.worker1".parse().unwrap(),
        "x".into(),
        "ckgen/0.1.0".into(),
    );

    session::connect_and_handshake(addr, &session, Duration::from_secs(5))
        .await
        .expect("handshake should succeed via the empty-params tier");

    pool.await.unwrap();

    let state = session.state.lock().await;
    assert!(!state.no_sessionid, "the session-id tier was never reachable, so it is never marked exhausted");
    assert!(state.no_params, "client-tag-only tier should have been abandoned");
    assert_eq!(state.enonce2_size, 4);
}

/// A session resuming with a remembered session id walks the full
/// three-tier ladder when every tier is rejected except the last.
#[tokio::test(start_paused = true)]
async fn resuming_session_walks_the_full_three_tier_ladder() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let pool = tokio::spawn(async move {
        reject_subscribe(&listener).await;
        reject_subscribe(&listener).await;
        accept_subscribe_and_authorize(&listener).await;
    });

    let session = UpstreamSession::new(
        "bc1qexample.worker1".parse().unwrap(),
        "x".into(),
        "ckgen/0.1.0".into(),
    );
    session.state.lock().await.session_id = Some("resume-me".into());

    session::connect_and_handshake(addr, &session, Duration::from_secs(5))
        .await
        .expect("handshake should succeed after exhausting the first two tiers");

    pool.await.unwrap();

    let state = session.state.lock().await;
    assert!(state.no_sessionid);
    assert!(state.no_params);
    assert_eq!(state.enonce2_size, 4);
}

#[tokio::test]
async fn first_tier_success_leaves_flags_untouched() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let pool = tokio::spawn(async move {
        accept_subscribe_and_authorize(&listener).await;
    });

    let session = UpstreamSession::new(
        "bc1qexample.worker1".parse().unwrap(),
        "x".into(),
        "ckgen/0.1.0".into(),
    );

    session::connect_and_handshake(addr, &session, Duration::from_secs(5))
        .await
        .unwrap();

    pool.await.unwrap();

    let state = session.state.lock().await;
    assert!(!state.no_sessionid);
    assert!(!state.no_params);
    assert_eq!(state.enonce2_size, 4);
}
