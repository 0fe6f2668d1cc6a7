#![no_main]

use libfuzzer_sys::fuzz_target;
use personal_agent_bridge::services::unsealer::parse_credential_payload;

fuzz_target!(|data: &[u8]| {
    let _ = parse_credential_payload(data);
});
