//! GIF-flavor LZW compression.
//!
//! Variable-width codes starting at `min_code_size + 1` bits, a clear
//! code at `1 << min_code_size`, end-of-information right after it, and a
//! 4096-entry table that resets through an explicit clear whenever it
//! fills. Output bits are packed LSB-first and framed into sub-blocks of
//! at most 255 bytes, terminated by a zero-length block.

use std::collections::HashMap;
use std::io::{self, Write};

const MAX_CODES: u16 = 4096;
const MAX_WIDTH: u8 = 12;

/// LSB-first bit packer.
struct BitWriter {
    bytes: Vec<u8>,
    acc: u32,
    filled: u8,
}

impl BitWriter {
    fn new() -> Self {
        BitWriter {
            bytes: Vec::new(),
            acc: 0,
            filled: 0,
        }
    }

    fn put(&mut self, code: u16, width: u8) {
        self.acc |= (code as u32) << self.filled;
        self.filled += width;
        while self.filled >= 8 {
            self.bytes.push(self.acc as u8);
            self.acc >>= 8;
            self.filled -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.bytes.push(self.acc as u8);
        }
        self.bytes
    }
}

/// Compress indexed pixels and write the complete image-data section:
/// the minimum-code-size byte, the sub-blocks, and the terminator.
pub fn encode<W: Write>(sink: &mut W, pixels: &[u8], min_code_size: u8) -> io::Result<()> {
    sink.write_all(&[min_code_size])?;

    let clear: u16 = 1 << min_code_size;
    let eoi: u16 = clear + 1;

    let mut table: HashMap<(u16, u8), u16> = HashMap::new();
    let mut next_code: u16 = eoi + 1;
    let mut width: u8 = min_code_size + 1;
    let mut bits = BitWriter::new();

    bits.put(clear, width);

    let mut pixels = pixels.iter().copied();
    if let Some(first) = pixels.next() {
        let mut prefix: u16 = first as u16;
        for px in pixels {
            if let Some(&code) = table.get(&(prefix, px)) {
                prefix = code;
                continue;
            }
            bits.put(prefix, width);
            if next_code < MAX_CODES {
                table.insert((prefix, px), next_code);
                if next_code == (1 << width) && width < MAX_WIDTH {
                    width += 1;
                }
                next_code += 1;
            } else {
                bits.put(clear, width);
                table.clear();
                next_code = eoi + 1;
                width = min_code_size + 1;
            }
            prefix = px as u16;
        }
        bits.put(prefix, width);
    }
    bits.put(eoi, width);

    for block in bits.finish().chunks(255) {
        sink.write_all(&[block.len() as u8])?;
        sink.write_all(block)?;
    }
    sink.write_all(&[0])
}
