#![no_main]

use libfuzzer_sys::fuzz_target;

// 任意字节只能得到值或错误，不能崩溃、死循环或耗尽栈。
fuzz_target!(|data: &[u8]| {
    tabcodec_fuzz::check_unpack(data);
});
