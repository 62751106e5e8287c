//! Fuzz target for the session ingest pipeline
//!
//! # Strategy
//!
//! - Arbitrary write chunking: random byte chunks through the accumulator
//! - Mixed traffic: garbage interleaved with structurally valid frames
//!
//! # Invariants
//!
//! - The accumulator never exceeds the frame limit
//! - Every frame the session enqueues validates as a well-formed frame
//! - Reply frame ids are strictly increasing
//! - The pipeline never panics and the session always shuts down cleanly

#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use drawframe_core::{HeapAllocator, Session};
use drawframe_proto::frame;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    chunks: Vec<Vec<u8>>,
}

fuzz_target!(|scenario: Scenario| {
    let session = Session::open(Arc::new(HeapAllocator));
    let mut last_frame_id = 0u32;

    for chunk in &scenario.chunks {
        let _ = session.write(chunk);

        while let Ok(reply) = session.next_event(false) {
            let valid = frame::validate(&reply).expect("enqueued frames are well-formed");
            assert_eq!(valid.frame_bytes(), reply.len());
            assert!(valid.frame_id() > last_frame_id);
            last_frame_id = valid.frame_id();
        }

        assert!(session.stats().inbuf_bytes <= drawframe_proto::MAX_FRAME_BYTES);
    }

    session.shutdown();
    assert!(session.next_event(false).is_err());
});
