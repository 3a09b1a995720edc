#![no_main]

use flash_sim_core::{
    FlashConfig, FlashError, FlashSimulator, InvalidArgument, NoDelay, ERASED_BYTE,
};
use libfuzzer_sys::fuzz_target;

const UNIT: u32 = 64;
const UNITS: u32 = 4;
const SIZE: usize = (UNIT * UNITS) as usize;

fuzz_target!(|data: &[u8]| {
    let config = FlashConfig::with_geometry(0, UNITS, UNIT);
    let Ok(mut sim) = FlashSimulator::with_delay(config, NoDelay) else {
        return;
    };
    let mut shadow = vec![0u8; SIZE];
    let mut protected = false;

    for op in data.chunks(4) {
        let [tag, a, b, c] = [
            op[0],
            op.get(1).copied().unwrap_or(0),
            op.get(2).copied().unwrap_or(0),
            op.get(3).copied().unwrap_or(0),
        ];
        let offset = u32::from(u16::from_be_bytes([a, b]));
        let len = usize::from(c);
        let in_range = offset as usize + len <= SIZE;

        match tag % 4 {
            0 => {
                let mut out = vec![0u8; len];
                let result = sim.read(offset, &mut out);
                assert_eq!(result.is_ok(), in_range);
                if in_range {
                    let start = offset as usize;
                    assert_eq!(out, shadow[start..start + len]);
                }
            }
            1 => {
                let payload: Vec<u8> = (0..len).map(|i| c.rotate_left(i as u32) ^ tag).collect();
                let result = sim.write(offset, &payload);
                match result {
                    Ok(()) => {
                        assert!(in_range && !protected);
                        let start = offset as usize;
                        for (cell, byte) in shadow[start..start + len].iter_mut().zip(&payload) {
                            *cell &= byte;
                        }
                    }
                    Err(FlashError::PermissionDenied) => assert!(in_range && protected),
                    Err(_) => assert!(!in_range),
                }
            }
            2 => {
                let offset = u32::from(a % 8) * UNIT / 2;
                let len = usize::from(b % 4) * UNIT as usize;
                let in_range = offset as usize + len <= SIZE;
                let aligned = offset % UNIT == 0;
                match sim.erase(offset, len) {
                    Ok(()) => {
                        assert!(in_range && !protected && aligned);
                        let start = offset as usize;
                        shadow[start..start + len].fill(ERASED_BYTE);
                    }
                    Err(FlashError::PermissionDenied) => assert!(in_range && protected),
                    Err(FlashError::InvalidArgument(InvalidArgument::OutOfRange { .. })) => {
                        assert!(!in_range);
                    }
                    Err(FlashError::InvalidArgument(InvalidArgument::Misaligned { .. })) => {
                        assert!(in_range && !protected && !aligned);
                    }
                    Err(error) => panic!("unexpected erase failure: {error}"),
                }
            }
            _ => {
                protected = a & 1 == 1;
                sim.set_write_protection(protected);
            }
        }

        assert_eq!(sim.raw_contents(), shadow.as_slice());
    }
});
