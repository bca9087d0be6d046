#![no_main]

use libfuzzer_sys::fuzz_target;
use peck::{Handler, Kind, Parser};

struct Sink;

impl Handler for Sink {}

fuzz_target!(|data: &[u8]| {
    for kind in [Kind::Request, Kind::Response, Kind::Either] {
        let mut sink = Sink;

        // Whole input in one call, then eof.
        let mut p = Parser::new(kind);
        if p.advance(&mut sink, data).is_ok() {
            let _ = p.advance(&mut sink, &[]);
        }

        // Split delivery must be equally panic free.
        let mut p = Parser::strict(kind);
        for chunk in data.chunks(7) {
            if p.advance(&mut sink, chunk).is_err() {
                break;
            }
        }
    }
});
