/// Font container formats recognised by their leading magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    /// Raw SFNT outline data (TrueType or CFF-flavoured OpenType).
    Sfnt,
    /// WOFF 1.0 (zlib-compressed tables).
    Woff,
    /// WOFF 2.0 (brotli-compressed, transformed tables).
    Woff2,
    Unknown,
}

impl ContainerFormat {
    pub fn sniff(bytes: &[u8]) -> Self {
        match bytes.get(..4) {
            Some(b"wOFF") => ContainerFormat::Woff,
            Some(b"wOF2") => ContainerFormat::Woff2,
            Some([0x00, 0x01, 0x00, 0x00]) | Some(b"OTTO") | Some(b"true") | Some(b"ttcf") => {
                ContainerFormat::Sfnt
            }
            _ => ContainerFormat::Unknown,
        }
    }

    /// Whether the data must go through the codec boundary before use.
    pub fn is_compressed(self) -> bool {
        matches!(self, ContainerFormat::Woff | ContainerFormat::Woff2)
    }

    pub fn name(self) -> &'static str {
        match self {
            ContainerFormat::Sfnt => "sfnt",
            ContainerFormat::Woff => "woff",
            ContainerFormat::Woff2 => "woff2",
            ContainerFormat::Unknown => "unknown",
        }
    }
}
