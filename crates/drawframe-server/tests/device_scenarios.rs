//! Device-level and socket-level end-to-end scenarios.

use std::sync::Arc;

use bytes::BytesMut;
use drawframe_core::DeviceError;
use drawframe_proto::{
    ErrCode, FrameBuilder, MsgType, frame,
    payloads::{
        DisplayOpenReq, HelloRep, HelloReq, Parse, PixelFormat, SurfaceCreateReq, Wire,
    },
};
use drawframe_server::{DrawDevice, DrawListener, PollEvents, ServerError, registry};

fn request<P: Wire>(msg_type: MsgType, msg_id: u32, payload: &P) -> BytesMut {
    let mut builder = FrameBuilder::new();
    builder.message(msg_type, msg_id, payload);
    builder.finish()
}

fn hello(msg_id: u32) -> BytesMut {
    request(
        MsgType::Hello,
        msg_id,
        &HelloReq { client_major: 1, client_minor: 0, client_flags: 0, max_reply_bytes: 65536 },
    )
}

/// Decode a single-message reply frame into (type, msg_id, payload).
fn parse_reply(frame_buf: &[u8]) -> (u16, u32, Vec<u8>) {
    let valid = frame::validate(frame_buf).expect("reply frames are well-formed");
    let msgs: Vec<_> = valid.messages().collect();
    assert_eq!(msgs.len(), 1);
    let msg = msgs[0].expect("reply messages are well-formed");
    (msg.msg_type(), msg.msg_id(), msg.payload().to_vec())
}

#[test]
fn read_returns_one_whole_frame() {
    let device = DrawDevice::new();
    let handle = device.open();
    handle.write(&hello(7)).unwrap();

    let mut buf = vec![0u8; drawframe_proto::MAX_EVENT_BYTES as usize];
    let n = handle.read(&mut buf).unwrap();
    assert_eq!(n, 44);

    let (msg_type, msg_id, payload) = parse_reply(&buf[..n]);
    assert_eq!(msg_type, MsgType::RplHello.to_u16());
    assert_eq!(msg_id, 7);
    assert_eq!(
        HelloRep::parse(&payload).unwrap(),
        HelloRep { server_major: 1, server_minor: 0, server_flags: 0, caps_bytes: 0 }
    );
}

#[test]
fn short_read_buffer_takes_a_prefix_and_consumes_the_frame() {
    let device = DrawDevice::new();
    let handle = device.open();
    handle.set_nonblocking(true);
    handle.write(&hello(1)).unwrap();
    handle.write(&hello(2)).unwrap();

    let mut small = [0u8; 10];
    assert_eq!(handle.read(&mut small).unwrap(), 10);

    // The short read consumed the first frame whole
    let mut buf = [0u8; 64];
    let n = handle.read(&mut buf).unwrap();
    assert_eq!(n, 44);
    let (_, msg_id, _) = parse_reply(&buf[..n]);
    assert_eq!(msg_id, 2);

    assert_eq!(handle.read(&mut buf), Err(DeviceError::WouldBlock));
}

#[test]
fn nonblocking_read_on_an_empty_queue_would_block() {
    let device = DrawDevice::new();
    let handle = device.open();
    handle.set_nonblocking(true);
    assert_eq!(handle.read_frame(), Err(DeviceError::WouldBlock));
}

#[test]
fn control_ops_and_mapping_through_the_handle() {
    let device = DrawDevice::new();
    let handle = device.open();
    handle.set_nonblocking(true);

    handle.write(&request(MsgType::DisplayOpen, 1, &DisplayOpenReq { display_id: 1 })).unwrap();
    handle
        .write(&request(
            MsgType::SurfaceCreate,
            2,
            &SurfaceCreateReq {
                width_px: 4,
                height_px: 2,
                format: PixelFormat::Xrgb8888.to_u32(),
                flags: 0,
            },
        ))
        .unwrap();
    handle.read_frame().unwrap();
    handle.read_frame().unwrap();

    let stats = handle.stats();
    assert_eq!(stats.frames_processed, 2);
    assert_eq!(stats.events_enqueued, 2);
    assert_eq!(stats.evq_depth, 0);

    let rec = handle.select_map_surface(1);
    assert_eq!(rec.status, ErrCode::Ok.status());
    assert_eq!(rec.stride_bytes, 16);
    assert_eq!(rec.bytes_total, 32);

    let mapping = handle.map(0, 32).unwrap();
    assert!(mapping.write_at(0, &[0x11; 16]));
    assert_eq!(handle.map(0, 33).unwrap_err(), DeviceError::InvalidArg);
}

#[test]
fn drop_closes_the_session_but_mappings_survive() {
    let device = DrawDevice::new();
    let handle = device.open();
    handle.set_nonblocking(true);

    handle.write(&request(MsgType::DisplayOpen, 1, &DisplayOpenReq { display_id: 1 })).unwrap();
    handle
        .write(&request(
            MsgType::SurfaceCreate,
            2,
            &SurfaceCreateReq {
                width_px: 2,
                height_px: 2,
                format: PixelFormat::Xrgb8888.to_u32(),
                flags: 0,
            },
        ))
        .unwrap();
    handle.select_map_surface(1);
    let mapping = handle.map(0, 16).unwrap();

    drop(handle);

    // The backing store persists for the outstanding mapping
    assert!(mapping.write_at(0, &[9; 4]));
    let mut back = [0u8; 4];
    assert!(mapping.read_at(0, &mut back));
    assert_eq!(back, [9; 4]);
}

#[test]
fn poll_reports_readability_transitions() {
    let device = DrawDevice::new();
    let handle = device.open();
    handle.set_nonblocking(true);

    assert_eq!(handle.poll(PollEvents::READABLE, None), PollEvents::empty());
    handle.write(&hello(1)).unwrap();
    assert_eq!(handle.poll(PollEvents::READABLE, None), PollEvents::READABLE);
    handle.read_frame().unwrap();
    assert_eq!(handle.poll(PollEvents::READABLE, None), PollEvents::empty());
    handle.shutdown();
    assert_eq!(handle.poll(PollEvents::READABLE, None), PollEvents::HANGUP);
}

#[test]
fn registry_lifecycle() {
    // The registry is process-global; this is the one test that touches it
    assert!(!registry::is_installed());
    assert!(matches!(registry::open(), Err(ServerError::NotInstalled)));

    registry::install(DrawDevice::new()).unwrap();
    assert!(registry::is_installed());
    assert!(matches!(registry::install(DrawDevice::new()), Err(ServerError::AlreadyInstalled)));

    let handle = registry::open().unwrap();
    handle.set_nonblocking(true);
    handle.write(&hello(1)).unwrap();
    assert_eq!(handle.read_frame().unwrap().len(), 44);

    assert!(registry::uninstall());
    assert!(!registry::uninstall());
    assert!(matches!(registry::open(), Err(ServerError::NotInstalled)));
}

#[tokio::test]
async fn socket_round_trip() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("draw.sock");

    let listener = DrawListener::bind(&path, Arc::new(DrawDevice::new())).unwrap();
    let server = tokio::spawn(listener.run());

    let mut stream = tokio::net::UnixStream::connect(&path).await.unwrap();
    stream.write_all(&hello(7)).await.unwrap();

    let mut reply = [0u8; 44];
    stream.read_exact(&mut reply).await.unwrap();
    let (msg_type, msg_id, payload) = parse_reply(&reply);
    assert_eq!(msg_type, MsgType::RplHello.to_u16());
    assert_eq!(msg_id, 7);
    assert_eq!(
        HelloRep::parse(&payload).unwrap(),
        HelloRep { server_major: 1, server_minor: 0, server_flags: 0, caps_bytes: 0 }
    );

    // Two clients are two independent sessions
    let mut second = tokio::net::UnixStream::connect(&path).await.unwrap();
    second.write_all(&hello(1)).await.unwrap();
    let mut reply = [0u8; 44];
    second.read_exact(&mut reply).await.unwrap();
    let valid = frame::validate(&reply).unwrap();
    // Fresh session, so its first reply carries frame_id 1
    assert_eq!(valid.frame_id(), 1);

    server.abort();
}
