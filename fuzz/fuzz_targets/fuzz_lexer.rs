#![no_main]

use ecmaparse::lexer::{Lexer, TokenKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    if source.len() > 100_000 {
        return;
    }

    // Every token stays inside the source and the stream always ends
    let mut lexer = Lexer::new(source);
    let mut last_end = 0;
    loop {
        let Ok(token) = lexer.next_token() else {
            break;
        };
        assert!(token.start >= last_end && token.end <= source.len());
        last_end = token.end;
        if matches!(token.kind, TokenKind::Eof) {
            break;
        }
    }
});
