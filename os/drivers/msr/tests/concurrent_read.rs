mod common;

use common::{CountingRegs, REGISTERS, SELF_DEV, attached};
use msr_driver::{CharDevice, Uio};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn concurrent_readers_share_one_instance() {
    let threads = 8;
    let iters = 500;

    let (driver, _nodes) = attached(CountingRegs::new(), true);
    let driver = Arc::new(driver);
    let start = Arc::new(Barrier::new(threads));

    let mut handles = Vec::with_capacity(threads);
    for t in 0..threads {
        let driver = Arc::clone(&driver);
        let start = Arc::clone(&start);
        handles.push(thread::spawn(move || {
            driver.open(SELF_DEV).unwrap();
            start.wait();
            for i in 0..iters {
                let (msr, value) = REGISTERS[(t + i) % REGISTERS.len()];
                let mut buf = [0u8; 8];
                let mut uio = Uio::new(&mut buf, i64::from(msr.raw()));
                driver.read(SELF_DEV, &mut uio).unwrap();
                assert_eq!(u64::from_ne_bytes(buf), value);
            }
            driver.close(SELF_DEV).unwrap();
        }));
    }

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(driver.registers().reads(), threads * iters);
}
