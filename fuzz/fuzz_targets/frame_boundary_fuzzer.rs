//! Fuzz target for frame parsing boundaries
//!
//! # Strategy
//!
//! - Raw bytes: Arbitrary byte sequences through peek/validate/walk
//! - Truncations: prefixes exercised implicitly by the corpus
//!
//! # Invariants
//!
//! - peek never reports a frame longer than the input
//! - validate never accepts a frame whose declared length overruns the
//!   buffer or is misaligned
//! - The message walk never reads outside the frame and always terminates
//! - NEVER panic on malformed input

#![no_main]

use drawframe_proto::{FrameHeader, Peek, frame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    match frame::peek(data) {
        Peek::Frame { len } => assert!(len <= data.len() && len % 4 == 0),
        Peek::NeedMore | Peek::Bad(_) => {}
    }

    if let Ok(valid) = frame::validate(data) {
        assert!(valid.frame_bytes() <= data.len());
        assert!(valid.frame_bytes() >= FrameHeader::SIZE);
        assert_eq!(valid.frame_bytes() % 4, 0);

        let mut walked = 0usize;
        for item in valid.messages() {
            walked += 1;
            // Termination backstop: a frame fits at most this many headers
            assert!(walked <= valid.frame_bytes() / 4 + 1);
            if let Ok(msg) = item {
                assert!((msg.offset() as usize) < valid.frame_bytes());
                assert!(msg.payload().len() <= valid.frame_bytes());
            }
        }
    }
});
