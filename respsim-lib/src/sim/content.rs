use rama::bytes::{BufMut as _, Bytes, BytesMut};

/// Pattern used to synthesize response body bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentFlavor {
    Zero,
    #[default]
    Random,
    Lorem,
    Json,
    Html,
}

impl ContentFlavor {
    /// Case-insensitive parse, `None` for unknown flavors.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        [
            Self::Zero,
            Self::Random,
            Self::Lorem,
            Self::Json,
            Self::Html,
        ]
        .into_iter()
        .find(|flavor| s.eq_ignore_ascii_case(flavor.as_str()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::Random => "random",
            Self::Lorem => "lorem",
            Self::Json => "json",
            Self::Html => "html",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Html => "text/html; charset=utf-8",
            Self::Zero | Self::Random | Self::Lorem => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ContentFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const LOREM_PHRASE: &[u8] = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit, \
sed do eiusmod tempor incididunt ut labore et dolore magna aliqua. ";

#[derive(Debug, Clone)]
enum Pattern {
    Zero,
    Random { seed: u64 },
    Repeat(&'static [u8]),
    /// Template followed by space padding.
    Template(Bytes),
}

/// Produces the bytes of a virtual body of `total_bytes` at any offset.
///
/// Every flavor is a pure function of the absolute offset,
/// so the body is identical no matter how it is chunked.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    flavor: ContentFlavor,
    pattern: Pattern,
}

impl Synthesizer {
    /// `seed` only matters for [`ContentFlavor::Random`],
    /// `timestamp` (unix seconds) for the templated flavors.
    pub fn new(flavor: ContentFlavor, total_bytes: u64, seed: u64, timestamp: u64) -> Self {
        let pattern = match flavor {
            ContentFlavor::Zero => Pattern::Zero,
            ContentFlavor::Random => Pattern::Random { seed },
            ContentFlavor::Lorem => Pattern::Repeat(LOREM_PHRASE),
            ContentFlavor::Json => Pattern::Template(json_template(total_bytes, timestamp)),
            ContentFlavor::Html => Pattern::Template(html_template(total_bytes, timestamp)),
        };
        Self { flavor, pattern }
    }

    pub fn flavor(&self) -> ContentFlavor {
        self.flavor
    }

    /// Exactly `len` bytes of the virtual body starting at `offset`.
    pub fn fill(&self, offset: u64, len: usize) -> Bytes {
        if len == 0 {
            return Bytes::new();
        }

        match &self.pattern {
            Pattern::Zero => BytesMut::zeroed(len).freeze(),
            Pattern::Random { seed } => random_fill(*seed, offset, len),
            Pattern::Repeat(phrase) => repeat_fill(phrase, offset, len),
            Pattern::Template(template) => template_fill(template, offset, len),
        }
    }
}

pub fn json_template(total_bytes: u64, timestamp: u64) -> Bytes {
    Bytes::from(format!(
        r#"{{"ok":true,"bytes":{total_bytes},"ts":{timestamp},"generator":"respsim"}}"#
    ))
}

pub fn html_template(total_bytes: u64, timestamp: u64) -> Bytes {
    Bytes::from(format!(
        r##"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>respsim</title></head>
<body>
<h1>respsim</h1>
<p>bytes: {total_bytes}</p>
<p>ts: {timestamp}</p>
</body>
</html>
"##
    ))
}

fn repeat_fill(phrase: &[u8], offset: u64, len: usize) -> Bytes {
    let mut buf = BytesMut::with_capacity(len);
    // phrase lengths are tiny, the remainder always fits usize
    let mut pos = (offset % phrase.len() as u64) as usize;
    while buf.len() < len {
        let take = (phrase.len() - pos).min(len - buf.len());
        buf.put_slice(&phrase[pos..pos + take]);
        pos = 0;
    }
    buf.freeze()
}

fn template_fill(template: &[u8], offset: u64, len: usize) -> Bytes {
    let mut buf = BytesMut::with_capacity(len);
    if let Ok(start) = usize::try_from(offset)
        && start < template.len()
    {
        let end = template.len().min(start + len);
        buf.put_slice(&template[start..end]);
    }
    buf.put_bytes(b' ', len - buf.len());
    buf.freeze()
}

fn random_fill(seed: u64, offset: u64, len: usize) -> Bytes {
    let mut buf = BytesMut::with_capacity(len);
    let mut block = offset / 8;
    let mut skip = (offset % 8) as usize;
    while buf.len() < len {
        let word = block_word(seed, block).to_le_bytes();
        let take = (8 - skip).min(len - buf.len());
        buf.put_slice(&word[skip..skip + take]);
        skip = 0;
        block = block.wrapping_add(1);
    }
    buf.freeze()
}

/// Counter based generator: the word of a block only depends on seed and block index.
fn block_word(seed: u64, block: u64) -> u64 {
    let mut z = seed.wrapping_add(block.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
