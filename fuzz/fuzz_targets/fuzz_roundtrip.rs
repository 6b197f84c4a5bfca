#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlarbor::reader::parse_str;
use xmlarbor::serial::serialize;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Anything that parses must serialize to text that parses again,
        // and both trees must have consistent indices.
        if let Ok(doc) = parse_str(s) {
            if let Some(root) = doc.root_element() {
                assert!(doc.verify_indices(root).is_ok());
            }
            let output = serialize(&doc);
            let reparsed = parse_str(&output)
                .unwrap_or_else(|e| panic!("canonical output does not parse: {e}\n{output}"));
            if let Some(root) = reparsed.root_element() {
                assert!(reparsed.verify_indices(root).is_ok());
            }
        }
    }
});
