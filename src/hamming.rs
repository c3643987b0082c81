/*! Hamming codec family.

Six fixed variants protect the assorted control fields of the two air
interfaces. Every block is a bool vector with the data bits leading
and the parity bits trailing; encoders fill in the trailing parities
and decoders repair at most one flipped bit.

Each variant is defined by its parity equations, given here as one
bitmask of data-bit indices per parity bit. A decoder recomputes the
parities, collects the mismatches into a syndrome (equation 0 in bit
0), and flips the unique position whose syndrome column matches, if
any. `true` means the block is now clean; `false` means at least two
bits are damaged and the block should be discarded.
 */

struct Variant {
    data: usize,
    /// One mask of data-bit indices per parity equation.
    equations: &'static [u16],
}

const H15113_1: Variant = Variant {
    data: 11,
    equations: &[0x07F, 0x38F, 0x5B3, 0x6D5],
};

const H15113_2: Variant = Variant {
    data: 11,
    equations: &[0x1AF, 0x35E, 0x6BC, 0x4D7],
};

const H1393: Variant = Variant {
    data: 9,
    equations: &[0x06B, 0x0D7, 0x1AF, 0x135],
};

const H1063: Variant = Variant {
    data: 6,
    equations: &[0x27, 0x2B, 0x1D, 0x1E],
};

const H16114: Variant = Variant {
    data: 11,
    equations: &[0x1AF, 0x35E, 0x6BC, 0x4D7, 0x765],
};

const H17123: Variant = Variant {
    data: 12,
    equations: &[0x2CF, 0x59F, 0xB3E, 0x4B3, 0x965],
};

fn parity(bits: &[bool], mask: u16) -> bool {
    let mut p = false;
    for (j, &bit) in bits.iter().enumerate() {
        if mask >> j & 1 == 1 {
            p ^= bit;
        }
    }
    p
}

fn encode(bits: &mut [bool], v: &Variant) {
    for i in 0..v.equations.len() {
        bits[v.data + i] = parity(&bits[..v.data], v.equations[i]);
    }
}

fn decode(bits: &mut [bool], v: &Variant) -> bool {
    let mut syndrome = 0u32;
    for (i, &eq) in v.equations.iter().enumerate() {
        if parity(&bits[..v.data], eq) != bits[v.data + i] {
            syndrome |= 1 << i;
        }
    }
    if syndrome == 0 {
        return true;
    }
    for j in 0..v.data {
        let column = v
            .equations
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, &eq)| acc | u32::from(eq >> j & 1) << i);
        if column == syndrome {
            bits[j] = !bits[j];
            return true;
        }
    }
    if syndrome.is_power_of_two() {
        let k = v.data + syndrome.trailing_zeros() as usize;
        bits[k] = !bits[k];
        return true;
    }
    false
}

/// Encode a (15,11,3) block, first parity set.
pub fn encode_15113_1(bits: &mut [bool; 15]) {
    encode(bits, &H15113_1);
}

/// Decode a (15,11,3) block, first parity set.
pub fn decode_15113_1(bits: &mut [bool; 15]) -> bool {
    decode(bits, &H15113_1)
}

/// Encode a (15,11,3) block, second parity set.
pub fn encode_15113_2(bits: &mut [bool; 15]) {
    encode(bits, &H15113_2);
}

/// Decode a (15,11,3) block, second parity set.
pub fn decode_15113_2(bits: &mut [bool; 15]) -> bool {
    decode(bits, &H15113_2)
}

/// Encode a (13,9,3) block.
pub fn encode_1393(bits: &mut [bool; 13]) {
    encode(bits, &H1393);
}

/// Decode a (13,9,3) block.
pub fn decode_1393(bits: &mut [bool; 13]) -> bool {
    decode(bits, &H1393)
}

/// Encode a (10,6,3) block.
pub fn encode_1063(bits: &mut [bool; 10]) {
    encode(bits, &H1063);
}

/// Decode a (10,6,3) block.
pub fn decode_1063(bits: &mut [bool; 10]) -> bool {
    decode(bits, &H1063)
}

/// Encode a (16,11,4) block.
pub fn encode_16114(bits: &mut [bool; 16]) {
    encode(bits, &H16114);
}

/// Decode a (16,11,4) block.
pub fn decode_16114(bits: &mut [bool; 16]) -> bool {
    decode(bits, &H16114)
}

/// Encode a (17,12,3) block.
pub fn encode_17123(bits: &mut [bool; 17]) {
    encode(bits, &H17123);
}

/// Decode a (17,12,3) block.
pub fn decode_17123(bits: &mut [bool; 17]) -> bool {
    decode(bits, &H17123)
}
