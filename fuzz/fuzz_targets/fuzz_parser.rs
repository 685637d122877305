#![no_main]

use ecmaparse::{Options, parse_module, parse_script};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    // Deep nesting in large inputs only measures the stack
    if source.len() > 100_000 {
        return;
    }

    // Both goals must return Ok or Err, never panic
    let options = Options {
        loc: true,
        ..Options::default()
    };
    if let Ok(program) = parse_script(source, &options) {
        assert!(program.span.end == source.len());
    }
    let _ = parse_module(source, &options);
});
