use async_trait::async_trait;
use fontweave_traits::{CodecError, FontCodec};
use fontweave_types::ContainerFormat;

const WOFF_HEADER_LEN: usize = 44;
const WOFF_DIR_ENTRY_LEN: usize = 20;
const SFNT_HEADER_LEN: usize = 12;
const SFNT_RECORD_LEN: usize = 16;

/// Codec for the containers that need no external tooling.
///
/// SFNT data passes through untouched and WOFF 1.0 is rebuilt into SFNT by
/// inflating each table. WOFF2 needs a brotli/transform decoder supplied
/// through another [`FontCodec`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinCodec;

#[async_trait]
impl FontCodec for BuiltinCodec {
    async fn decompress(&self, format: ContainerFormat, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        match format {
            ContainerFormat::Sfnt => Ok(bytes.to_vec()),
            ContainerFormat::Woff => decode_woff(bytes),
            ContainerFormat::Woff2 => Err(CodecError::Unsupported("woff2")),
            ContainerFormat::Unknown => Err(CodecError::Unsupported("unknown")),
        }
    }

    fn name(&self) -> &'static str {
        "builtin"
    }
}

fn malformed(message: impl Into<String>) -> CodecError {
    CodecError::Malformed {
        format: "woff",
        message: message.into(),
    }
}

fn read_u16(data: &[u8], at: usize) -> Result<u16, CodecError> {
    data.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| malformed(format!("truncated at byte {}", at)))
}

fn read_u32(data: &[u8], at: usize) -> Result<u32, CodecError> {
    data.get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| malformed(format!("truncated at byte {}", at)))
}

struct WoffTable {
    tag: [u8; 4],
    checksum: u32,
    data: Vec<u8>,
}

/// Rebuilds the SFNT a WOFF 1.0 file wraps.
fn decode_woff(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    if data.get(..4) != Some(b"wOFF".as_slice()) {
        return Err(malformed("missing wOFF signature"));
    }
    let flavor = read_u32(data, 4)?;
    let num_tables = read_u16(data, 12)? as usize;
    if num_tables == 0 || num_tables > 4095 {
        return Err(malformed(format!("implausible table count {}", num_tables)));
    }

    let mut tables = Vec::with_capacity(num_tables);
    for i in 0..num_tables {
        let entry = WOFF_HEADER_LEN + i * WOFF_DIR_ENTRY_LEN;
        let tag_bytes = data
            .get(entry..entry + 4)
            .ok_or_else(|| malformed("truncated table directory"))?;
        let tag = [tag_bytes[0], tag_bytes[1], tag_bytes[2], tag_bytes[3]];
        let offset = read_u32(data, entry + 4)? as usize;
        let comp_length = read_u32(data, entry + 8)? as usize;
        let orig_length = read_u32(data, entry + 12)? as usize;
        let checksum = read_u32(data, entry + 16)?;

        let stored = offset
            .checked_add(comp_length)
            .and_then(|end| data.get(offset..end))
            .ok_or_else(|| malformed(format!("table {} lies outside the file", String::from_utf8_lossy(&tag))))?;

        let table = if comp_length < orig_length {
            let inflated = miniz_oxide::inflate::decompress_to_vec_zlib_with_limit(stored, orig_length)
                .map_err(|e| malformed(format!("inflating {}: {:?}", String::from_utf8_lossy(&tag), e.status)))?;
            if inflated.len() != orig_length {
                return Err(malformed(format!(
                    "table {} inflated to {} bytes, expected {}",
                    String::from_utf8_lossy(&tag),
                    inflated.len(),
                    orig_length
                )));
            }
            inflated
        } else if comp_length == orig_length {
            stored.to_vec()
        } else {
            return Err(malformed("compressed length exceeds original length"));
        };
        tables.push(WoffTable { tag, checksum, data: table });
    }

    Ok(build_sfnt(flavor, &tables))
}

fn build_sfnt(flavor: u32, tables: &[WoffTable]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let max_pow2 = 1u16 << (15 - num_tables.leading_zeros().min(15));
    let search_range = max_pow2 * 16;
    let entry_selector = max_pow2.trailing_zeros() as u16;
    let range_shift = num_tables * 16 - search_range;

    let mut out = Vec::new();
    out.extend_from_slice(&flavor.to_be_bytes());
    out.extend_from_slice(&num_tables.to_be_bytes());
    out.extend_from_slice(&search_range.to_be_bytes());
    out.extend_from_slice(&entry_selector.to_be_bytes());
    out.extend_from_slice(&range_shift.to_be_bytes());

    let mut offset = SFNT_HEADER_LEN + tables.len() * SFNT_RECORD_LEN;
    for table in tables {
        out.extend_from_slice(&table.tag);
        out.extend_from_slice(&table.checksum.to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(table.data.len() as u32).to_be_bytes());
        offset += padded(table.data.len());
    }
    for table in tables {
        out.extend_from_slice(&table.data);
        out.resize(out.len() + padded(table.data.len()) - table.data.len(), 0);
    }
    out
}

fn padded(len: usize) -> usize {
    (len + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;

    fn woff_with(tables: &[(&[u8; 4], Vec<u8>, bool)]) -> Vec<u8> {
        let mut header = Vec::new();
        header.extend_from_slice(b"wOFF");
        header.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        header.extend_from_slice(&0u32.to_be_bytes()); // length, unchecked
        header.extend_from_slice(&(tables.len() as u16).to_be_bytes());
        header.resize(WOFF_HEADER_LEN, 0);

        let mut directory = Vec::new();
        let mut body = Vec::new();
        let data_start = WOFF_HEADER_LEN + tables.len() * WOFF_DIR_ENTRY_LEN;
        for (tag, data, compress) in tables {
            let stored = if *compress {
                miniz_oxide::deflate::compress_to_vec_zlib(data, 6)
            } else {
                data.clone()
            };
            directory.extend_from_slice(*tag);
            directory.extend_from_slice(&((data_start + body.len()) as u32).to_be_bytes());
            directory.extend_from_slice(&(stored.len() as u32).to_be_bytes());
            directory.extend_from_slice(&(data.len() as u32).to_be_bytes());
            directory.extend_from_slice(&0xDEAD_BEEFu32.to_be_bytes());
            body.extend_from_slice(&stored);
            body.resize(padded(body.len()), 0);
        }
        [header, directory, body].concat()
    }

    #[tokio::test]
    async fn rebuilds_sfnt_from_woff() {
        let glyf = vec![7u8; 300];
        let head = vec![1u8, 2, 3, 4, 5];
        let woff = woff_with(&[(b"glyf", glyf.clone(), true), (b"head", head.clone(), false)]);
        assert_eq!(ContainerFormat::sniff(&woff), ContainerFormat::Woff);

        let sfnt = BuiltinCodec.decompress(ContainerFormat::Woff, &woff).await.unwrap();
        assert_eq!(ContainerFormat::sniff(&sfnt), ContainerFormat::Sfnt);
        assert_eq!(read_u16(&sfnt, 4).unwrap(), 2);
        assert_eq!(read_u16(&sfnt, 6).unwrap(), 32); // searchRange
        assert_eq!(&sfnt[12..16], b"glyf");
        assert_eq!(read_u32(&sfnt, 16).unwrap(), 0xDEAD_BEEF);

        let glyf_offset = read_u32(&sfnt, 20).unwrap() as usize;
        assert_eq!(glyf_offset, SFNT_HEADER_LEN + 2 * SFNT_RECORD_LEN);
        assert_eq!(&sfnt[glyf_offset..glyf_offset + glyf.len()], glyf.as_slice());

        let head_offset = read_u32(&sfnt, 36).unwrap() as usize;
        assert_eq!(head_offset % 4, 0);
        assert_eq!(&sfnt[head_offset..head_offset + head.len()], head.as_slice());
    }

    #[tokio::test]
    async fn sfnt_passes_through_and_woff2_is_unsupported() {
        let ttf = vec![0x00, 0x01, 0x00, 0x00, 9, 9];
        assert_eq!(BuiltinCodec.decompress(ContainerFormat::Sfnt, &ttf).await.unwrap(), ttf);
        assert_eq!(
            BuiltinCodec.decompress(ContainerFormat::Woff2, b"wOF2....").await,
            Err(CodecError::Unsupported("woff2"))
        );
    }

    #[tokio::test]
    async fn truncated_woff_is_malformed() {
        let mut woff = woff_with(&[(b"glyf", vec![1u8; 64], true)]);
        woff.truncate(WOFF_HEADER_LEN + 8);
        let err = BuiltinCodec.decompress(ContainerFormat::Woff, &woff).await.unwrap_err();
        assert!(matches!(err, CodecError::Malformed { format: "woff", .. }));
    }
}
