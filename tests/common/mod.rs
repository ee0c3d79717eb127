//! Shared test support: a small GIF89a parser and a reference LZW
//! decoder, used to verify encoder output block by block.

/// One parsed frame.
#[derive(Debug)]
pub struct ParsedFrame {
    pub disposal: u8,
    pub delay_centis: u16,
    pub transparent_index: Option<u8>,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub local_palette: Option<Vec<[u8; 3]>>,
    pub indices: Vec<u8>,
}

/// A parsed GIF89a stream.
#[derive(Debug)]
pub struct ParsedGif {
    pub width: u16,
    pub height: u16,
    pub global_palette: Vec<[u8; 3]>,
    /// `(loop_count)` per Netscape block encountered.
    pub netscape_loops: Vec<u16>,
    pub frames: Vec<ParsedFrame>,
    pub trailer_seen: bool,
}

/// Parse an encoder-produced GIF. Panics on malformed streams; these are
/// tests, after all.
pub fn parse_gif(bytes: &[u8]) -> ParsedGif {
    assert_eq!(&bytes[0..6], b"GIF89a", "signature");
    let mut pos = 6;

    let width = u16::from_le_bytes([bytes[pos], bytes[pos + 1]]);
    let height = u16::from_le_bytes([bytes[pos + 2], bytes[pos + 3]]);
    let packed = bytes[pos + 4];
    assert_eq!(bytes[pos + 5], 0, "background color index");
    assert_eq!(bytes[pos + 6], 0, "aspect ratio");
    pos += 7;

    assert!(packed & 0x80 != 0, "global color table expected");
    let gct_entries = 2usize << (packed & 7);
    let mut global_palette = Vec::with_capacity(gct_entries);
    for _ in 0..gct_entries {
        global_palette.push([bytes[pos], bytes[pos + 1], bytes[pos + 2]]);
        pos += 3;
    }

    let mut netscape_loops = Vec::new();
    let mut frames = Vec::new();
    let mut pending_gce: Option<(u8, u16, Option<u8>)> = None;
    let mut trailer_seen = false;

    while pos < bytes.len() {
        match bytes[pos] {
            0x3B => {
                trailer_seen = true;
                pos += 1;
                assert_eq!(pos, bytes.len(), "data after trailer");
            }
            0x21 => match bytes[pos + 1] {
                0xF9 => {
                    assert_eq!(bytes[pos + 2], 4, "GCE block size");
                    let packed = bytes[pos + 3];
                    let delay = u16::from_le_bytes([bytes[pos + 4], bytes[pos + 5]]);
                    let transparent = (packed & 1 != 0).then_some(bytes[pos + 6]);
                    assert_eq!(bytes[pos + 7], 0, "GCE terminator");
                    pending_gce = Some(((packed >> 2) & 7, delay, transparent));
                    pos += 8;
                }
                0xFF => {
                    assert_eq!(bytes[pos + 2], 0x0B);
                    assert_eq!(&bytes[pos + 3..pos + 14], b"NETSCAPE2.0");
                    assert_eq!(bytes[pos + 14], 0x03);
                    assert_eq!(bytes[pos + 15], 0x01);
                    netscape_loops
                        .push(u16::from_le_bytes([bytes[pos + 16], bytes[pos + 17]]));
                    assert_eq!(bytes[pos + 18], 0, "netscape terminator");
                    pos += 19;
                }
                other => panic!("unexpected extension label {other:#04X}"),
            },
            0x2C => {
                let x = u16::from_le_bytes([bytes[pos + 1], bytes[pos + 2]]);
                let y = u16::from_le_bytes([bytes[pos + 3], bytes[pos + 4]]);
                let w = u16::from_le_bytes([bytes[pos + 5], bytes[pos + 6]]);
                let h = u16::from_le_bytes([bytes[pos + 7], bytes[pos + 8]]);
                let packed = bytes[pos + 9];
                pos += 10;

                let local_palette = if packed & 0x80 != 0 {
                    let entries = 2usize << (packed & 7);
                    let mut pal = Vec::with_capacity(entries);
                    for _ in 0..entries {
                        pal.push([bytes[pos], bytes[pos + 1], bytes[pos + 2]]);
                        pos += 3;
                    }
                    Some(pal)
                } else {
                    None
                };

                let mcs = bytes[pos];
                pos += 1;
                let mut data = Vec::new();
                loop {
                    let len = bytes[pos] as usize;
                    pos += 1;
                    if len == 0 {
                        break;
                    }
                    data.extend_from_slice(&bytes[pos..pos + len]);
                    pos += len;
                }

                let (disposal, delay, transparent) = pending_gce.take().expect("GCE before image");
                frames.push(ParsedFrame {
                    disposal,
                    delay_centis: delay,
                    transparent_index: transparent,
                    x,
                    y,
                    width: w,
                    height: h,
                    local_palette,
                    indices: lzw_decode(mcs, &data),
                });
            }
            other => panic!("unexpected block introducer {other:#04X} at {pos}"),
        }
    }

    ParsedGif {
        width,
        height,
        global_palette,
        netscape_loops,
        frames,
        trailer_seen,
    }
}

/// Reference GIF LZW decoder over a deframed code stream.
pub fn lzw_decode(min_code_size: u8, data: &[u8]) -> Vec<u8> {
    let clear: u16 = 1 << min_code_size;
    let eoi: u16 = clear + 1;

    let mut out = Vec::new();
    let mut dict: Vec<Vec<u8>> = Vec::new();
    let reset = |dict: &mut Vec<Vec<u8>>| {
        dict.clear();
        for i in 0..clear {
            dict.push(vec![i as u8]);
        }
        dict.push(Vec::new());
        dict.push(Vec::new());
    };
    reset(&mut dict);

    let mut width = min_code_size + 1;
    let mut acc: u32 = 0;
    let mut filled: u8 = 0;
    let mut prev: Option<u16> = None;

    for &byte in data {
        acc |= (byte as u32) << filled;
        filled += 8;
        while filled >= width {
            let code = (acc & ((1 << width) - 1)) as u16;
            acc >>= width;
            filled -= width;

            if code == clear {
                reset(&mut dict);
                width = min_code_size + 1;
                prev = None;
                continue;
            }
            if code == eoi {
                return out;
            }

            let entry = if (code as usize) < dict.len() {
                dict[code as usize].clone()
            } else {
                let p = &dict[prev.expect("first code must be literal") as usize];
                let mut e = p.clone();
                e.push(p[0]);
                e
            };
            out.extend_from_slice(&entry);

            if let Some(p) = prev {
                let mut new = dict[p as usize].clone();
                new.push(entry[0]);
                dict.push(new);
                if dict.len() == (1usize << width) && width < 12 {
                    width += 1;
                }
            }
            prev = Some(code);
        }
    }
    out
}
