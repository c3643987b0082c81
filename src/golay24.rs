/*! Golay (24,12) codec.

Protects the YSF frame information channel (FICH). Twelve data bits
sit in codeword positions [23:12] with twelve parity bits below,
packed MSB first across all three bytes of the buffer:

```text
byte 0        byte 1        byte 2
[23 ..... 16] [15 ...... 8] [7 ....... 0]
```

Unlike the (20,8) code there is no reserved nibble, and every error
pattern of up to three bits is corrected exactly.
 */
use crate::bits::{error_pattern, poly_div};

/// Generator polynomial.
const GENERATOR: u32 = 0xC75;

const WIDTH: u32 = 24;

fn assemble(data: &[u8; 3]) -> u32 {
    (u32::from(data[0]) << 16) | (u32::from(data[1]) << 8) | u32::from(data[2])
}

fn store(data: &mut [u8; 3], code: u32) {
    data[0] = (code >> 16) as u8;
    data[1] = (code >> 8) as u8;
    data[2] = code as u8;
}

/// Encode in place the 12 data bits held in byte 0 and the high
/// nibble of byte 1.
pub fn encode(data: &mut [u8; 3]) {
    let value = ((u32::from(data[0]) << 4) | (u32::from(data[1]) >> 4)) << 12;
    store(data, value | poly_div(value, GENERATOR, WIDTH));
}

/// Decode and repair a codeword in place.
///
/// Returns the number of corrected bits (0 to 3), or `None` when more
/// than three bits are damaged beyond what the syndrome explains.
#[must_use]
pub fn decode(data: &mut [u8; 3]) -> Option<u32> {
    let code = assemble(data);
    let syndrome = poly_div(code, GENERATOR, WIDTH);
    let pattern = error_pattern(syndrome, GENERATOR, WIDTH)?;
    store(data, code ^ pattern);
    Some(pattern.count_ones())
}
