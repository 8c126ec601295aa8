//! # dppack
//!
//! Tag-length-value encoding for runtime frames and serialised compound addresses.
//!
//! Every item starts with a one-byte tag. Fixed-size values follow the tag
//! directly; strings, byte runs and containers carry a `u32` length first, so a
//! reader can step over any item it does not understand.
//!
//! ```text
//! bool      [tag]
//! u32       [tag][4]
//! guid      [tag][16]
//! str/bytes [tag][len: 4][len bytes]
//! list/map  [tag][len: 4][items]
//! variant   [tag][len: 4][name: str][one item]
//! ```
//!
//! Multi-byte integers are little-endian. A map holds only variants, the variant
//! name serving as the key.

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The byte is not a known tag, or not the tag the caller asked for.
    InvalidTag(u8),
    InvalidUtf8,
    /// A container was closed by the wrong `*_end` call.
    ScopeMismatch { expected: Scope, actual: Scope },
    /// `*_end` with nothing open.
    ScopeUnderflow,
    /// `into_bytes` with a container still open.
    ScopeStillOpen,
    /// The input ended inside an item.
    UnexpectedEnd,
    /// A length does not fit the 4-byte length field.
    BlobTooLarge(usize),
    /// A second item was written into a variant.
    TooManyItems(Scope),
    /// A variant was closed with no item.
    EmptyVariant,
    /// Something other than a variant was written into a map.
    InvalidMapEntry,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidTag(b) => write!(f, "unexpected tag {:#04x}", b),
            Error::InvalidUtf8 => write!(f, "string is not UTF-8"),
            Error::ScopeMismatch { expected, actual } => {
                write!(f, "closing {:?} while {:?} is open", expected, actual)
            }
            Error::ScopeUnderflow => write!(f, "no open container to close"),
            Error::ScopeStillOpen => write!(f, "container left open"),
            Error::UnexpectedEnd => write!(f, "input ended mid-item"),
            Error::BlobTooLarge(len) => write!(f, "{} bytes do not fit a u32 length", len),
            Error::TooManyItems(s) => write!(f, "{:?} holds exactly one item", s),
            Error::EmptyVariant => write!(f, "variant closed without an item"),
            Error::InvalidMapEntry => write!(f, "map entries must be variants"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    BoolTrue = 0x01,
    BoolFalse = 0x02,
    U32 = 0x05,
    String = 0x10,
    Bytes = 0x11,
    /// 16 raw bytes, no length.
    Guid = 0x12,
    List = 0x20,
    Map = 0x21,
    Variant = 0x33,
}

impl TryFrom<u8> for Tag {
    type Error = Error;

    fn try_from(b: u8) -> Result<Self> {
        Ok(match b {
            0x01 => Tag::BoolTrue,
            0x02 => Tag::BoolFalse,
            0x05 => Tag::U32,
            0x10 => Tag::String,
            0x11 => Tag::Bytes,
            0x12 => Tag::Guid,
            0x20 => Tag::List,
            0x21 => Tag::Map,
            0x33 => Tag::Variant,
            other => return Err(Error::InvalidTag(other)),
        })
    }
}

impl Tag {
    /// Bytes after the tag for fixed-size items; `None` when a length follows.
    fn fixed_len(self) -> Option<usize> {
        match self {
            Tag::BoolTrue | Tag::BoolFalse => Some(0),
            Tag::U32 => Some(4),
            Tag::Guid => Some(16),
            Tag::String | Tag::Bytes | Tag::List | Tag::Map | Tag::Variant => None,
        }
    }
}

/// What kind of container the encoder is currently writing into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Top level, outside any container.
    Root,
    List,
    Map,
    Variant,
}

struct Open {
    scope: Scope,
    /// Offset of the first body byte; the length field sits just before it.
    body: usize,
    items: usize,
}

/// Builds a buffer item by item, checking container rules as it goes.
///
/// Container lengths are filled in when the container is closed.
pub struct Encoder {
    buf: Vec<u8>,
    top: Open,
    open: Vec<Open>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(128),
            top: Open { scope: Scope::Root, body: 0, items: 0 },
            open: Vec::new(),
        }
    }

    /// Finishes the buffer. Fails if a container is still open.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self.open.is_empty() {
            true => Ok(self.buf),
            false => Err(Error::ScopeStillOpen),
        }
    }

    /// Items written at the top level.
    pub fn root_items(&self) -> usize {
        self.top.items
    }

    fn innermost(&mut self) -> &mut Open {
        self.open.last_mut().unwrap_or(&mut self.top)
    }

    /// Checks that `tag` may be written here and writes it.
    fn start_item(&mut self, tag: Tag) -> Result<()> {
        let current = self.innermost();
        match current.scope {
            Scope::Map if tag != Tag::Variant => return Err(Error::InvalidMapEntry),
            Scope::Variant if current.items > 0 => return Err(Error::TooManyItems(Scope::Variant)),
            _ => {}
        }
        self.buf.push(tag as u8);
        Ok(())
    }

    fn finish_item(&mut self) {
        self.innermost().items += 1;
    }

    fn fixed(&mut self, tag: Tag, body: &[u8]) -> Result<()> {
        self.start_item(tag)?;
        self.buf.extend_from_slice(body);
        self.finish_item();
        Ok(())
    }

    fn sized(&mut self, tag: Tag, body: &[u8]) -> Result<()> {
        let len = u32::try_from(body.len()).map_err(|_| Error::BlobTooLarge(body.len()))?;
        self.start_item(tag)?;
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(body);
        self.finish_item();
        Ok(())
    }

    fn open_container(&mut self, tag: Tag, scope: Scope) -> Result<()> {
        self.start_item(tag)?;
        self.buf.extend_from_slice(&[0; 4]);
        self.open.push(Open { scope, body: self.buf.len(), items: 0 });
        Ok(())
    }

    fn close_container(&mut self, expected: Scope) -> Result<()> {
        let Some(current) = self.open.last() else {
            return Err(Error::ScopeUnderflow);
        };
        if current.scope != expected {
            return Err(Error::ScopeMismatch { expected, actual: current.scope });
        }
        if current.scope == Scope::Variant && current.items == 0 {
            return Err(Error::EmptyVariant);
        }

        let body = current.body;
        let len = self.buf.len() - body;
        let len = u32::try_from(len).map_err(|_| Error::BlobTooLarge(len))?;
        self.buf[body - 4..body].copy_from_slice(&len.to_le_bytes());

        self.open.pop();
        self.finish_item();
        Ok(())
    }

    pub fn bool(&mut self, v: bool) -> Result<()> {
        self.fixed(if v { Tag::BoolTrue } else { Tag::BoolFalse }, &[])
    }

    pub fn u32(&mut self, v: u32) -> Result<()> {
        self.fixed(Tag::U32, &v.to_le_bytes())
    }

    /// Writes the 16 bytes of an identifier as given.
    pub fn guid(&mut self, v: &[u8; 16]) -> Result<()> {
        self.fixed(Tag::Guid, v)
    }

    pub fn str(&mut self, v: &str) -> Result<()> {
        self.sized(Tag::String, v.as_bytes())
    }

    pub fn bytes(&mut self, v: &[u8]) -> Result<()> {
        self.sized(Tag::Bytes, v)
    }

    pub fn list_begin(&mut self) -> Result<()> {
        self.open_container(Tag::List, Scope::List)
    }

    pub fn list_end(&mut self) -> Result<()> {
        self.close_container(Scope::List)
    }

    /// Opens a map; each entry is written with `variant_begin(key)`.
    pub fn map_begin(&mut self) -> Result<()> {
        self.open_container(Tag::Map, Scope::Map)
    }

    pub fn map_end(&mut self) -> Result<()> {
        self.close_container(Scope::Map)
    }

    /// Opens a named variant. Exactly one item goes in before `variant_end`.
    pub fn variant_begin(&mut self, name: &str) -> Result<()> {
        self.open_container(Tag::Variant, Scope::Variant)?;
        self.str(name)?;
        // the name does not count as the variant's item
        self.innermost().items = 0;
        Ok(())
    }

    pub fn variant_end(&mut self) -> Result<()> {
        self.close_container(Scope::Variant)
    }
}

/// Reads items from a borrowed buffer without copying.
///
/// A failed read leaves the cursor where it was. Containers are read as
/// sub-decoders over exactly their body.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn peek_tag(&self) -> Result<Tag> {
        let &first = self.buf.first().ok_or(Error::UnexpectedEnd)?;
        Tag::try_from(first)
    }

    /// Length in bytes of the whole next item, tag included.
    fn item_len(&self) -> Result<usize> {
        let tag = self.peek_tag()?;
        let len = match tag.fixed_len() {
            Some(n) => 1 + n,
            None => {
                let field = self.buf.get(1..5).ok_or(Error::UnexpectedEnd)?;
                5 + u32::from_le_bytes([field[0], field[1], field[2], field[3]]) as usize
            }
        };
        if len > self.buf.len() {
            return Err(Error::UnexpectedEnd);
        }
        Ok(len)
    }

    /// Takes the next item if it has tag `expected`, returning the bytes after
    /// the tag and any length field.
    fn take(&mut self, expected: Tag) -> Result<&'a [u8]> {
        let tag = self.peek_tag()?;
        if tag != expected {
            return Err(Error::InvalidTag(tag as u8));
        }
        let len = self.item_len()?;
        let header = if tag.fixed_len().is_some() { 1 } else { 5 };
        let (item, rest) = self.buf.split_at(len);
        self.buf = rest;
        Ok(&item[header..])
    }

    /// Steps over the next item, containers included.
    pub fn skip(&mut self) -> Result<()> {
        let len = self.item_len()?;
        self.buf = &self.buf[len..];
        Ok(())
    }

    pub fn bool(&mut self) -> Result<bool> {
        match self.peek_tag()? {
            Tag::BoolTrue => self.take(Tag::BoolTrue).map(|_| true),
            Tag::BoolFalse => self.take(Tag::BoolFalse).map(|_| false),
            other => Err(Error::InvalidTag(other as u8)),
        }
    }

    pub fn u32(&mut self) -> Result<u32> {
        let body = self.take(Tag::U32)?;
        Ok(u32::from_le_bytes([body[0], body[1], body[2], body[3]]))
    }

    pub fn guid(&mut self) -> Result<[u8; 16]> {
        let body = self.take(Tag::Guid)?;
        let mut raw = [0u8; 16];
        raw.copy_from_slice(body);
        Ok(raw)
    }

    pub fn str(&mut self) -> Result<&'a str> {
        let mut probe = self.clone();
        let text = std::str::from_utf8(probe.take(Tag::String)?).map_err(|_| Error::InvalidUtf8)?;
        *self = probe;
        Ok(text)
    }

    pub fn bytes(&mut self) -> Result<&'a [u8]> {
        self.take(Tag::Bytes)
    }

    pub fn list(&mut self) -> Result<ListIter<'a>> {
        Ok(ListIter { body: Decoder::new(self.take(Tag::List)?) })
    }

    pub fn map(&mut self) -> Result<MapIter<'a>> {
        Ok(MapIter { body: Decoder::new(self.take(Tag::Map)?) })
    }

    /// Reads a variant as its name and a decoder positioned on its item.
    pub fn variant(&mut self) -> Result<(&'a str, Decoder<'a>)> {
        let mut probe = self.clone();
        let mut body = Decoder::new(probe.take(Tag::Variant)?);
        let name = body.str()?;
        *self = probe;
        Ok((name, body))
    }
}

/// Items of a list, each as its own decoder.
#[derive(Debug)]
pub struct ListIter<'a> {
    body: Decoder<'a>,
}

impl<'a> ListIter<'a> {
    pub fn next(&mut self) -> Result<Option<Decoder<'a>>> {
        if self.body.remaining() == 0 {
            return Ok(None);
        }
        let len = self.body.item_len()?;
        let (item, rest) = self.body.buf.split_at(len);
        self.body.buf = rest;
        Ok(Some(Decoder::new(item)))
    }
}

/// Entries of a map as `(key, value)` pairs.
#[derive(Debug)]
pub struct MapIter<'a> {
    body: Decoder<'a>,
}

impl<'a> MapIter<'a> {
    pub fn next(&mut self) -> Result<Option<(&'a str, Decoder<'a>)>> {
        if self.body.remaining() == 0 {
            return Ok(None);
        }
        self.body.variant().map(Some)
    }
}
