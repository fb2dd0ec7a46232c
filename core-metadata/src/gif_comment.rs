//! GIF channel: the packed map stored in a single comment extension.

use crate::error::FormatError;
use crate::{packed, MetadataMap};
use tracing::debug;

const HEADER_LEN: usize = 6;
const SCREEN_DESCRIPTOR_LEN: usize = 7;
const IMAGE_DESCRIPTOR_LEN: usize = 10;

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_SEPARATOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;
const COMMENT_LABEL: u8 = 0xFE;

const MAX_SUB_BLOCK: usize = 255;

pub(crate) fn read(data: &[u8]) -> Result<MetadataMap, FormatError> {
    let layout = parse(data)?;

    for block in layout.blocks.iter().filter(|b| b.is_comment()) {
        let payload = sub_block_payload(&block.raw[2..]);
        let text = String::from_utf8_lossy(&payload);
        match packed::unpack(&text) {
            Some(map) => return Ok(map),
            None => debug!(len = payload.len(), "GIF comment is not a packed metadata map"),
        }
    }

    Ok(MetadataMap::new())
}

pub(crate) fn write(data: &[u8], map: &MetadataMap) -> Result<Vec<u8>, FormatError> {
    let layout = parse(data)?;

    let mut out = Vec::with_capacity(data.len() + 64);
    // Comment extensions need the 89a header.
    out.extend_from_slice(b"GIF89a");
    out.extend_from_slice(&data[HEADER_LEN..layout.preamble_end]);

    if !map.is_empty() {
        out.extend_from_slice(&comment_extension(packed::pack(map).as_bytes()));
    }

    for block in layout.blocks.iter().filter(|b| !b.is_comment()) {
        out.extend_from_slice(block.raw);
    }
    if !layout.has_trailer {
        out.push(TRAILER);
    }

    Ok(out)
}

fn comment_extension(payload: &[u8]) -> Vec<u8> {
    let mut block = vec![EXTENSION_INTRODUCER, COMMENT_LABEL];
    for chunk in payload.chunks(MAX_SUB_BLOCK) {
        block.push(chunk.len() as u8);
        block.extend_from_slice(chunk);
    }
    block.push(0);
    block
}

struct Block<'a> {
    raw: &'a [u8],
}

impl Block<'_> {
    fn is_comment(&self) -> bool {
        self.raw.len() >= 2 && self.raw[0] == EXTENSION_INTRODUCER && self.raw[1] == COMMENT_LABEL
    }
}

struct Layout<'a> {
    /// End of header, screen descriptor and global color table
    preamble_end: usize,
    blocks: Vec<Block<'a>>,
    has_trailer: bool,
}

fn parse(data: &[u8]) -> Result<Layout<'_>, FormatError> {
    if !(data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a")) {
        return Err(FormatError::malformed("missing GIF header"));
    }
    if data.len() < HEADER_LEN + SCREEN_DESCRIPTOR_LEN {
        return Err(FormatError::malformed("truncated GIF screen descriptor"));
    }

    let flags = data[HEADER_LEN + 4];
    let mut pos = HEADER_LEN + SCREEN_DESCRIPTOR_LEN + color_table_len(flags);
    if pos > data.len() {
        return Err(FormatError::malformed("truncated GIF global color table"));
    }
    let preamble_end = pos;

    let mut blocks = Vec::new();
    let mut has_trailer = false;

    // Some encoders omit the trailer; running out of bytes between blocks is tolerated.
    while let Some(&introducer) = data.get(pos) {
        let start = pos;
        match introducer {
            TRAILER => {
                blocks.push(Block {
                    raw: &data[pos..pos + 1],
                });
                has_trailer = true;
                break;
            }
            EXTENSION_INTRODUCER => {
                if pos + 2 > data.len() {
                    return Err(FormatError::malformed("truncated GIF extension"));
                }
                pos = skip_sub_blocks(data, pos + 2)?;
            }
            IMAGE_SEPARATOR => {
                let descriptor = data
                    .get(pos..pos + IMAGE_DESCRIPTOR_LEN)
                    .ok_or_else(|| FormatError::malformed("truncated GIF image descriptor"))?;
                pos += IMAGE_DESCRIPTOR_LEN + color_table_len(descriptor[9]);
                // LZW minimum code size
                pos += 1;
                if pos > data.len() {
                    return Err(FormatError::malformed("truncated GIF image data"));
                }
                pos = skip_sub_blocks(data, pos)?;
            }
            other => {
                return Err(FormatError::malformed(format!(
                    "unexpected GIF block 0x{:02X} at offset {}",
                    other, pos
                )))
            }
        }
        blocks.push(Block {
            raw: &data[start..pos],
        });
    }

    Ok(Layout {
        preamble_end,
        blocks,
        has_trailer,
    })
}

fn color_table_len(flags: u8) -> usize {
    if flags & 0x80 == 0 {
        0
    } else {
        3 * (1usize << ((flags & 0x07) + 1))
    }
}

/// Returns the offset just past the zero-length terminator.
fn skip_sub_blocks(data: &[u8], mut pos: usize) -> Result<usize, FormatError> {
    loop {
        let size = *data
            .get(pos)
            .ok_or_else(|| FormatError::malformed("GIF sub-blocks run past end of file"))?
            as usize;
        pos += 1;
        if size == 0 {
            return Ok(pos);
        }
        pos += size;
        if pos > data.len() {
            return Err(FormatError::malformed("GIF sub-block runs past end of file"));
        }
    }
}

fn sub_block_payload(mut data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    while let Some((&size, rest)) = data.split_first() {
        let size = size as usize;
        if size == 0 || size > rest.len() {
            break;
        }
        payload.extend_from_slice(&rest[..size]);
        data = &rest[size..];
    }
    payload
}
