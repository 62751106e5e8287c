//! Property-based tests over the session engine.
//!
//! The unit scenarios pin exact bytes; these verify the bookkeeping
//! invariants for arbitrary interleavings: accumulator conservation under
//! any write chunking, well-formedness of every enqueued frame, and the
//! surface-table caps under arbitrary create/destroy sequences.

use std::sync::Arc;

use bytes::BytesMut;
use drawframe_core::{
    DeviceError, HeapAllocator, MAX_SESSION_BYTES, MAX_SURFACES, Session, StatsSnapshot,
};
use drawframe_proto::{
    FrameBuilder, FrameHeader, MsgHeader, MsgType, align4, frame,
    payloads::{
        DisplayOpenReq, HelloReq, Parse, PixelFormat, SurfaceCreateRep, SurfaceCreateReq,
        SurfaceDestroyReq, Wire,
    },
};
use proptest::prelude::*;

fn open_session() -> Arc<Session> {
    Session::open(Arc::new(HeapAllocator))
}

fn request<P: Wire>(msg_type: MsgType, msg_id: u32, payload: &P) -> BytesMut {
    let mut builder = FrameBuilder::new();
    builder.message(msg_type, msg_id, payload);
    builder.finish()
}

fn hello(msg_id: u32) -> BytesMut {
    request(
        MsgType::Hello,
        msg_id,
        &HelloReq { client_major: 1, client_minor: 0, client_flags: 0, max_reply_bytes: 0 },
    )
}

fn drain(session: &Session) -> Vec<bytes::Bytes> {
    let mut frames = Vec::new();
    loop {
        match session.next_event(false) {
            Ok(frame_buf) => frames.push(frame_buf),
            Err(err) => {
                assert_eq!(err, DeviceError::WouldBlock);
                return frames;
            }
        }
    }
}

#[test]
fn prop_accumulator_conserves_bytes_under_any_chunking() {
    proptest!(|(
        complete in 1usize..8,
        tail in 0usize..44,
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
    )| {
        let mut stream = Vec::new();
        for i in 0..complete {
            stream.extend_from_slice(&hello(i as u32));
        }
        let partial = hello(99);
        stream.extend_from_slice(&partial[..tail]);

        // Cut the stream into arbitrary chunks and write them in order
        let mut offsets: Vec<usize> = cuts.iter().map(|ix| ix.index(stream.len() + 1)).collect();
        offsets.push(0);
        offsets.push(stream.len());
        offsets.sort_unstable();
        offsets.dedup();

        let session = open_session();
        for pair in offsets.windows(2) {
            let chunk = &stream[pair[0]..pair[1]];
            prop_assert_eq!(session.write(chunk), Ok(chunk.len()));
        }

        // PROPERTY: accumulator length == bytes written - bytes consumed by
        // extracted frames
        let stats: StatsSnapshot = session.stats();
        prop_assert_eq!(stats.bytes_in, stream.len() as u64);
        prop_assert_eq!(stats.frames_received, complete as u64);
        prop_assert_eq!(stats.inbuf_bytes as usize, tail);
        prop_assert_eq!(stats.events_enqueued, complete as u64);
    });
}

#[test]
fn prop_every_enqueued_frame_is_well_formed() {
    let known = [
        MsgType::Hello.to_u16(),
        MsgType::DisplayList.to_u16(),
        MsgType::DisplayOpen.to_u16(),
        MsgType::SurfaceCreate.to_u16(),
        MsgType::SurfaceDestroy.to_u16(),
    ];

    proptest!(|(codes in prop::collection::vec(
        prop_oneof![
            prop::sample::select(known.to_vec()),
            Just(MsgType::SurfacePresent.to_u16()),
            0x0002u16..0x0010u16,
        ],
        1..12,
    ))| {
        let session = open_session();
        for (i, code) in codes.iter().enumerate() {
            // Built by hand so arbitrary type codes can go on the wire; a
            // 16-byte payload satisfies every request's fixed part
            let mut raw = BytesMut::from(&FrameHeader::new(0).to_bytes()[..]);
            raw.extend_from_slice(&MsgHeader::new(*code, 32, i as u32).to_bytes());
            raw.extend_from_slice(&[0u8; 16]);
            let len = raw.len() as u32;
            raw[8..12].copy_from_slice(&len.to_le_bytes());
            prop_assert_eq!(session.write(&raw), Ok(raw.len()));
        }

        let replies = drain(&session);
        prop_assert_eq!(replies.len(), codes.len());
        for (i, reply) in replies.iter().enumerate() {
            let valid = frame::validate(reply)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            // PROPERTY: declared length equals buffer length
            prop_assert_eq!(valid.frame_bytes(), reply.len());
            // PROPERTY: frame ids are 1-based and sequential in queue order
            prop_assert_eq!(valid.frame_id(), i as u32 + 1);

            let msgs: Vec<_> = valid.messages().collect();
            prop_assert_eq!(msgs.len(), 1);
            let msg = msgs[0].map_err(|e| TestCaseError::fail(e.to_string()))?;
            // PROPERTY: frame length is header + aligned message
            prop_assert_eq!(
                reply.len() as u32,
                FrameHeader::SIZE as u32
                    + align4((MsgHeader::SIZE + msg.payload().len()) as u32)
            );
            prop_assert_eq!(msg.msg_id(), i as u32);
        }
    });
}

#[derive(Debug, Clone, Copy)]
enum SurfaceOp {
    Create { width_px: u32, height_px: u32 },
    Destroy { surface_id: u32 },
}

fn surface_op() -> impl Strategy<Value = SurfaceOp> {
    prop_oneof![
        (1u32..6000, 1u32..6000)
            .prop_map(|(width_px, height_px)| SurfaceOp::Create { width_px, height_px }),
        (1u32..100).prop_map(|surface_id| SurfaceOp::Destroy { surface_id }),
    ]
}

#[test]
fn prop_surface_caps_hold_under_arbitrary_op_sequences() {
    proptest!(|(ops in prop::collection::vec(surface_op(), 1..160))| {
        let session = open_session();
        session.write(&request(MsgType::DisplayOpen, 0, &DisplayOpenReq { display_id: 1 })).unwrap();
        drain(&session);

        let mut live: Vec<(u32, u64)> = Vec::new(); // (id, bytes)
        let mut last_id = 0u32;

        for (i, op) in ops.iter().enumerate() {
            match *op {
                SurfaceOp::Create { width_px, height_px } => {
                    session
                        .write(&request(
                            MsgType::SurfaceCreate,
                            i as u32,
                            &SurfaceCreateReq {
                                width_px,
                                height_px,
                                format: PixelFormat::Xrgb8888.to_u32(),
                                flags: 0,
                            },
                        ))
                        .unwrap();
                    let reply = drain(&session);
                    prop_assert_eq!(reply.len(), 1);
                    let valid = frame::validate(&reply[0])
                        .map_err(|e| TestCaseError::fail(e.to_string()))?;
                    let msgs: Vec<_> = valid.messages().collect();
                    let msg = msgs[0].map_err(|e| TestCaseError::fail(e.to_string()))?;
                    let rep = SurfaceCreateRep::parse(msg.payload())
                        .ok_or_else(|| TestCaseError::fail("short create reply"))?;

                    if rep.status == 0 {
                        // PROPERTY: ids are strictly increasing
                        prop_assert!(rep.surface_id > last_id);
                        last_id = rep.surface_id;
                        prop_assert_eq!(rep.stride_bytes, width_px * 4);
                        live.push((rep.surface_id, u64::from(rep.bytes_total)));
                    }

                    // PROPERTY: caps hold after every op
                    prop_assert!(live.len() <= MAX_SURFACES);
                    let total: u64 = live.iter().map(|(_, b)| *b).sum();
                    prop_assert!(total <= MAX_SESSION_BYTES);
                }
                SurfaceOp::Destroy { surface_id } => {
                    session
                        .write(&request(
                            MsgType::SurfaceDestroy,
                            i as u32,
                            &SurfaceDestroyReq { surface_id },
                        ))
                        .unwrap();
                    drain(&session);
                    live.retain(|(id, _)| *id != surface_id);
                }
            }
        }
    });
}

#[test]
fn prop_no_events_after_close() {
    proptest!(|(writes in prop::collection::vec(any::<u32>(), 0..8))| {
        let session = open_session();
        for msg_id in &writes {
            session.write(&hello(*msg_id)).unwrap();
        }
        session.shutdown();

        // PROPERTY: after close, reads and writes fail and the queue stays
        // drained forever
        prop_assert_eq!(session.next_event(false), Err(DeviceError::Closed));
        prop_assert_eq!(session.write(&hello(1)), Err(DeviceError::Closed));
        prop_assert_eq!(session.stats().evq_depth, 0);

        let enqueued = session.stats().events_enqueued;
        prop_assert_eq!(enqueued, writes.len() as u64);
    });
}
