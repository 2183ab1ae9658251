//! Fuzz target: IoT hub topic and connection-string parsing
//!
//! cargo fuzz run fuzz_hub_topic

#![no_main]

use libfuzzer_sys::fuzz_target;
use loadctl::iothub::{self, ConnectionString, InboundTopic};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = core::str::from_utf8(data) else { return };

    if let InboundTopic::Method { name, rid } = iothub::classify(s, "dev") {
        assert!(!name.is_empty());
        assert!(s.contains(rid));
    }

    if let Ok(cs) = ConnectionString::parse(s) {
        assert!(!cs.host_name.is_empty());
        assert!(!cs.device_id.is_empty());
        assert!(!cs.shared_access_signature.is_empty());
    }
});
