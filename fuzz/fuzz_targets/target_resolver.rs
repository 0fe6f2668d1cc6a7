#![no_main]

use libfuzzer_sys::fuzz_target;
use personal_agent_bridge::services::resolver::resolve_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let _ = resolve_target(&text);
});
