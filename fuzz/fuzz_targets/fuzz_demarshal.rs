// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use hdbus::{Limits, Message};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let limits = Limits::new().max_message_bytes(1 << 20);

    // Any frame that parses must survive a re-marshal unchanged
    if let Ok(msg) = Message::demarshal(data, &limits) {
        let _ = msg.values();
        if let Ok(frame) = msg.marshal() {
            let again = Message::demarshal(&frame, &limits);
            assert_eq!(again.as_ref().ok(), Some(&msg));
        }
    }
});
