use dppack::Decoder;
use dppack::Encoder;

use super::AddressElement;
use super::Error;
use super::Result;
use crate::guid::Guid;

/// A serialised compound address and the number of elements it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedAddress {
    pub bytes: Vec<u8>,
    pub count: usize,
}

/// Append-only, ordered collection of address elements.
///
/// Duplicates are kept; the caller decides what goes in and in which order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundAddress {
    elements: Vec<AddressElement>,
}

impl CompoundAddress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, element: AddressElement) {
        self.elements.push(element);
    }

    /// Appends a freshly built element.
    pub fn add_element(&mut self, data_type: Guid, payload: impl Into<Vec<u8>>) {
        self.add(AddressElement::new(data_type, payload));
    }

    pub fn elements(&self) -> &[AddressElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Encodes the elements in insertion order.
    ///
    /// Layout: a list with one `{type: guid, data: bytes}` map per element.
    pub fn serialize(&self) -> Result<SerializedAddress> {
        let mut enc = Encoder::new();
        enc.list_begin()?;
        for element in &self.elements {
            enc.map_begin()?;
            enc.variant_begin("type")?;
            enc.guid(&element.data_type().to_bytes())?;
            enc.variant_end()?;
            enc.variant_begin("data")?;
            enc.bytes(element.payload())?;
            enc.variant_end()?;
            enc.map_end()?;
        }
        enc.list_end()?;

        Ok(SerializedAddress {
            bytes: enc.into_bytes()?,
            count: self.elements.len(),
        })
    }

    /// Decodes a buffer produced by `serialize`.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let mut dec = Decoder::new(bytes);
        let mut list = dec.list()?;
        let mut address = Self::new();

        while let Some(mut item) = list.next()? {
            let mut map = item.map()?;
            let mut data_type = None;
            let mut data = None;
            while let Some((key, mut val)) = map.next()? {
                match key {
                    "type" => data_type = Some(Guid::from_bytes(val.guid()?)),
                    "data" => data = Some(val.bytes()?.to_vec()),
                    _ => val.skip()?,
                }
            }
            address.add(AddressElement::new(
                data_type.ok_or(Error::MissingField("type"))?,
                data.ok_or(Error::MissingField("data"))?,
            ));
        }

        Ok(address)
    }
}

impl Extend<AddressElement> for CompoundAddress {
    fn extend<T: IntoIterator<Item = AddressElement>>(&mut self, iter: T) {
        self.elements.extend(iter);
    }
}
