//! End-to-end sessions against a scripted runtime on an in-memory stream.

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::io::DuplexStream;
use tokio::io::ReadHalf;
use tokio::io::WriteHalf;

use dplay::guid;
use dplay::guid::Guid;
use dplay::launch;
use dplay::lobby::GetProperty;
use dplay::lobby::GetPropertyResponse;
use dplay::lobby::LobbyDispatcher;
use dplay::lobby::LobbyMessage;
use dplay::lobby::ResultCode;
use dplay::lobby::SystemMessage;
use dplay::provider::BuiltinProvider;
use dplay::provider::ProviderTable;
use dplay::runtime;
use dplay::runtime::AppId;
use dplay::session::SessionDescriptor;
use dplay::session::SessionOption;
use dplay::stream::StreamRuntime;
use dplay::wire;
use dplay::wire::Frame;

type Client = StreamRuntime<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

const APP: AppId = AppId(3);

fn connect(providers: Arc<ProviderTable>) -> (Client, DuplexStream) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (reader, writer) = tokio::io::split(client);
    (StreamRuntime::new(reader, writer, providers), server)
}

fn descriptor(provider: Guid) -> SessionDescriptor {
    [
        SessionOption::Host(None),
        SessionOption::Player("bob".into()),
        SessionOption::Application("{5BFDB060-06A4-11D0-9C4F-00A0C905425E}".parse().unwrap()),
        SessionOption::ServiceProvider(provider),
        SessionOption::Address(dplay::address::parse_chunk("INet=127.0.0.1").unwrap()),
        SessionOption::SessionName("lan party".into()),
    ]
    .into_iter()
    .collect()
}

fn message(msg: SystemMessage) -> Frame {
    Frame::Message { app: APP, message: LobbyMessage::System(msg).encode() }
}

async fn expect_frame(server: &mut DuplexStream) -> Frame {
    wire::read_frame(server).await.unwrap().expect("stream closed early")
}

// --- Launch and terminate ---

#[tokio::test]
async fn test_host_session_runs_until_terminated() {
    let providers = Arc::new(ProviderTable::with_system_providers());
    let (client, mut server) = connect(providers.clone());
    let desc = descriptor(guid::DPSPGUID_TCPIP);
    let session_id = desc.session_id;

    let peer = tokio::spawn(async move {
        let launch = match expect_frame(&mut server).await {
            Frame::Launch(request) => request,
            other => panic!("expected Launch, got {}", other.name()),
        };
        wire::write_frame(&mut server, &Frame::Launched { app: APP }).await.unwrap();
        wire::write_frame(&mut server, &message(SystemMessage::ConnectSucceeded { instance: None }))
            .await
            .unwrap();
        wire::write_frame(&mut server, &message(SystemMessage::AppTerminated)).await.unwrap();
        (launch, server)
    });

    let registry = BuiltinProvider::new(providers);
    let report = launch::run_session(&client, &registry, &desc, &LobbyDispatcher::new(), |_, _| {})
        .await
        .unwrap();

    let (request, _server) = peer.await.unwrap();
    assert!(request.host);
    assert_eq!(request.session, session_id);
    assert_eq!(request.player, "bob");
    assert_eq!(request.name.as_deref(), Some("lan party"));
    assert_eq!(request.password, None);
    assert_eq!(request.address.count, 2);

    let address = dplay::address::CompoundAddress::deserialize(&request.address.bytes).unwrap();
    assert_eq!(address.elements()[0].data_type(), guid::DPAID_SERVICE_PROVIDER);
    assert_eq!(address.elements()[1].payload(), b"127.0.0.1\0");

    assert_eq!(report.app, APP);
    assert_eq!(report.messages.handled, 2);
    assert!(report.messages.stopped_by_handler);
}

// --- Property requests ---

#[tokio::test]
async fn test_property_request_is_answered_over_the_stream() {
    let providers = Arc::new(ProviderTable::with_system_providers());
    let (client, mut server) = connect(providers.clone());
    let request = GetProperty {
        request_id: 11,
        player: Guid::NULL,
        property_tag: "{01020304-0506-0708-090A-0B0C0D0E0F10}".parse().unwrap(),
    };

    let peer = tokio::spawn(async move {
        let _launch = expect_frame(&mut server).await;
        wire::write_frame(&mut server, &Frame::Launched { app: APP }).await.unwrap();
        wire::write_frame(&mut server, &message(SystemMessage::GetProperty(request))).await.unwrap();
        let reply = expect_frame(&mut server).await;
        wire::write_frame(&mut server, &message(SystemMessage::AppTerminated)).await.unwrap();
        (reply, server)
    });

    let registry = BuiltinProvider::new(providers);
    let desc = descriptor(guid::DPSPGUID_IPX);
    launch::run_session(&client, &registry, &desc, &LobbyDispatcher::new(), |_, _| {})
        .await
        .unwrap();

    let (reply, _server) = peer.await.unwrap();
    let Frame::Send { app, data } = reply else {
        panic!("expected Send, got {}", reply.name());
    };
    assert_eq!(app, APP);

    let response = GetPropertyResponse::decode(&data).unwrap();
    assert_eq!(response.request_id, 11);
    assert_eq!(response.property_tag, request.property_tag);
    assert_eq!(response.result, ResultCode::UnknownProperty);
}

// --- Built-in provider ---

#[tokio::test]
async fn test_launch_failure_releases_builtin_provider() {
    let providers = Arc::new(ProviderTable::with_system_providers());
    let (client, mut server) = connect(providers.clone());

    let peer = tokio::spawn(async move {
        let _launch = expect_frame(&mut server).await;
        let failed = Frame::LaunchFailed { code: 0x8877_0014, reason: "application not found".into() };
        wire::write_frame(&mut server, &failed).await.unwrap();
        server
    });

    let registry = BuiltinProvider::new(providers.clone());
    let desc = descriptor(guid::DPSPGUID_DPRUN);
    let mut launched = false;
    let err = launch::run_session(&client, &registry, &desc, &LobbyDispatcher::new(), |_, _| launched = true)
        .await
        .unwrap_err();

    let _server = peer.await.unwrap();
    assert!(matches!(
        err,
        launch::Error::Launch(runtime::Error::LaunchFailed { code: 0x8877_0014, .. })
    ));
    assert!(!launched);
    assert!(!providers.contains(&guid::DPSPGUID_DPRUN));
}

#[tokio::test]
async fn test_builtin_provider_is_registered_only_for_the_session() {
    let providers = Arc::new(ProviderTable::with_system_providers());
    let (client, mut server) = connect(providers.clone());
    let observed = providers.clone();

    let peer = tokio::spawn(async move {
        let _launch = expect_frame(&mut server).await;
        let during = observed.contains(&guid::DPSPGUID_DPRUN);
        wire::write_frame(&mut server, &Frame::Launched { app: APP }).await.unwrap();
        wire::write_frame(&mut server, &Frame::Terminated { app: APP }).await.unwrap();
        (during, server)
    });

    let registry = BuiltinProvider::new(providers.clone());
    let desc = descriptor(guid::DPSPGUID_DPRUN);
    let report = launch::run_session(&client, &registry, &desc, &LobbyDispatcher::new(), |_, _| {})
        .await
        .unwrap();

    let (during, _server) = peer.await.unwrap();
    assert!(during);
    assert!(!providers.contains(&guid::DPSPGUID_DPRUN));
    assert!(!report.messages.stopped_by_handler);
}

#[tokio::test]
async fn test_second_launched_frame_ends_session_and_releases_provider() {
    let providers = Arc::new(ProviderTable::with_system_providers());
    let (client, mut server) = connect(providers.clone());

    let peer = tokio::spawn(async move {
        let _launch = expect_frame(&mut server).await;
        wire::write_frame(&mut server, &Frame::Launched { app: APP }).await.unwrap();
        wire::write_frame(&mut server, &message(SystemMessage::ConnectSucceeded { instance: None }))
            .await
            .unwrap();
        wire::write_frame(&mut server, &Frame::Launched { app: APP }).await.unwrap();
        server
    });

    let registry = BuiltinProvider::new(providers.clone());
    let desc = descriptor(guid::DPSPGUID_DPRUN);
    let err = launch::run_session(&client, &registry, &desc, &LobbyDispatcher::new(), |_, _| {})
        .await
        .unwrap_err();

    let _server = peer.await.unwrap();
    assert!(matches!(err, launch::Error::Receive(runtime::Error::Protocol(_))));
    assert!(!providers.contains(&guid::DPSPGUID_DPRUN));
}

#[tokio::test]
async fn test_unregistered_provider_is_refused_locally() {
    let providers = Arc::new(ProviderTable::new());
    let (client, server) = connect(providers.clone());

    let registry = BuiltinProvider::new(providers);
    let desc = descriptor(guid::DPSPGUID_SERIAL);
    let err = launch::run_session(&client, &registry, &desc, &LobbyDispatcher::new(), |_, _| {})
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        launch::Error::Launch(runtime::Error::ProviderUnavailable(p)) if p == guid::DPSPGUID_SERIAL
    ));
    drop(server);
}

// --- Validation ---

#[tokio::test]
async fn test_incomplete_descriptor_never_reaches_the_runtime() {
    let providers = Arc::new(ProviderTable::with_system_providers());
    let (client, mut server) = connect(providers.clone());

    let registry = BuiltinProvider::new(providers.clone());
    let desc: SessionDescriptor = [SessionOption::ServiceProvider(guid::DPSPGUID_DPRUN)].into_iter().collect();
    let err = launch::run_session(&client, &registry, &desc, &LobbyDispatcher::new(), |_, _| {})
        .await
        .unwrap_err();

    assert!(matches!(err, launch::Error::Invalid(_)));
    assert!(!providers.contains(&guid::DPSPGUID_DPRUN));

    // nothing was written to the runtime
    drop(client);
    assert!(wire::read_frame(&mut server).await.unwrap().is_none());
}

// --- Framing ---

#[tokio::test]
async fn test_oversized_frame_is_rejected() {
    let (mut a, mut b) = tokio::io::duplex(1024);
    a.write_all(&((wire::MAX_FRAME_LEN as u32) + 1).to_le_bytes()).await.unwrap();

    let err = wire::read_frame(&mut b).await.unwrap_err();
    assert!(matches!(err, runtime::Error::PayloadTooLarge(_)));
}

#[tokio::test]
async fn test_frames_survive_the_stream() {
    let (mut a, mut b) = tokio::io::duplex(1024);
    let frames = [
        Frame::Launched { app: APP },
        message(SystemMessage::NewSessionHost { instance: Some(guid::DPSPGUID_IPX) }),
        Frame::Send { app: APP, data: vec![0; 52] },
        Frame::Terminated { app: APP },
    ];
    for frame in &frames {
        wire::write_frame(&mut a, frame).await.unwrap();
    }
    drop(a);

    for frame in &frames {
        assert_eq!(&wire::read_frame(&mut b).await.unwrap().unwrap(), frame);
    }
    assert!(wire::read_frame(&mut b).await.unwrap().is_none());
}
