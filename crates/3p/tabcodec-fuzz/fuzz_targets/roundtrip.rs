#![no_main]

use libfuzzer_sys::fuzz_target;
use tabcodec_fuzz::{RoundtripCase, check_roundtrip};

// 任意值森林（含共享与环）在任意字节序组合下往返后必须结构相等。
fuzz_target!(|case: RoundtripCase| {
    check_roundtrip(&case);
});
