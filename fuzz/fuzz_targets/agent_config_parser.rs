#![no_main]

use libfuzzer_sys::fuzz_target;
use personal_agent_bridge::models::parse_config;

fuzz_target!(|data: &[u8]| {
    let _ = parse_config(data);
});
