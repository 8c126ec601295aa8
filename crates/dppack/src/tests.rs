use crate::*;

// ============================================================================
//  SCALARS AND BLOBS
// ============================================================================

#[test]
fn test_scalars_are_little_endian() -> Result<()> {
    let mut enc = Encoder::new();
    enc.u32(0x0403_0201)?;
    enc.bool(true)?;

    let bytes = enc.into_bytes()?;
    assert_eq!(bytes, vec![Tag::U32 as u8, 0x01, 0x02, 0x03, 0x04, Tag::BoolTrue as u8]);
    Ok(())
}

#[test]
fn test_guid_is_sixteen_raw_bytes() -> Result<()> {
    let raw: [u8; 16] = core::array::from_fn(|i| i as u8);
    let mut enc = Encoder::new();
    enc.guid(&raw)?;
    enc.u32(u32::MAX)?;

    let bytes = enc.into_bytes()?;
    assert_eq!(bytes.len(), 1 + 16 + 1 + 4);

    let mut dec = Decoder::new(&bytes);
    assert_eq!(dec.guid()?, raw);
    assert_eq!(dec.u32()?, u32::MAX);
    assert_eq!(dec.remaining(), 0);
    Ok(())
}

#[test]
fn test_bytes_keep_embedded_nul() -> Result<()> {
    let payload = b"127.0.0.1\0";
    let mut enc = Encoder::new();
    enc.bytes(payload)?;
    enc.str("")?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    assert_eq!(dec.bytes()?, payload);
    assert_eq!(dec.str()?, "");
    Ok(())
}

#[test]
fn test_invalid_utf8_string() {
    let bytes = vec![Tag::String as u8, 2, 0, 0, 0, 0xFF, 0xFE];
    let mut dec = Decoder::new(&bytes);
    assert_eq!(dec.str(), Err(Error::InvalidUtf8));
}

#[test]
fn test_wrong_tag_is_rejected() -> Result<()> {
    let mut enc = Encoder::new();
    enc.u32(7)?;
    let bytes = enc.into_bytes()?;

    let mut dec = Decoder::new(&bytes);
    assert_eq!(dec.guid(), Err(Error::InvalidTag(Tag::U32 as u8)));
    // a failed read does not advance the cursor
    assert_eq!(dec.u32()?, 7);
    Ok(())
}

#[test]
fn test_truncated_input() {
    let bytes = vec![Tag::Guid as u8, 1, 2, 3];
    let mut dec = Decoder::new(&bytes);
    assert_eq!(dec.guid(), Err(Error::UnexpectedEnd));

    let empty = Decoder::new(&[]);
    assert_eq!(empty.peek_tag(), Err(Error::UnexpectedEnd));
}

#[test]
fn test_unknown_tag_byte() {
    let bytes = vec![0x7F];
    let mut dec = Decoder::new(&bytes);
    assert_eq!(dec.peek_tag(), Err(Error::InvalidTag(0x7F)));
    assert_eq!(dec.skip(), Err(Error::InvalidTag(0x7F)));
    assert_eq!(dec.remaining(), 1);
}

#[test]
fn test_failed_string_read_does_not_advance() -> Result<()> {
    let mut bytes = vec![Tag::String as u8, 1, 0, 0, 0, 0xFF];
    let mut enc = Encoder::new();
    enc.bytes(&[1])?;
    bytes.extend(enc.into_bytes()?);

    let mut dec = Decoder::new(&bytes);
    assert_eq!(dec.str(), Err(Error::InvalidUtf8));
    dec.skip()?;
    assert_eq!(dec.bytes()?, &[1]);
    Ok(())
}

// ============================================================================
//  CONTAINERS
// ============================================================================

#[test]
fn test_list_preserves_order() -> Result<()> {
    let mut enc = Encoder::new();
    enc.list_begin()?;
    for i in 0..5u32 {
        enc.u32(i)?;
    }
    enc.list_end()?;
    assert_eq!(enc.root_items(), 1);

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    let mut list = dec.list()?;
    let mut seen = Vec::new();
    while let Some(mut item) = list.next()? {
        seen.push(item.u32()?);
    }
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    Ok(())
}

#[test]
fn test_empty_list() -> Result<()> {
    let mut enc = Encoder::new();
    enc.list_begin()?;
    enc.list_end()?;

    let bytes = enc.into_bytes()?;
    assert_eq!(bytes, vec![Tag::List as u8, 0, 0, 0, 0]);

    let mut dec = Decoder::new(&bytes);
    assert!(dec.list()?.next()?.is_none());
    Ok(())
}

#[test]
fn test_map_skips_unknown_keys() -> Result<()> {
    let mut enc = Encoder::new();
    enc.map_begin()?;
    enc.variant_begin("future")?;
    enc.list_begin()?;
    enc.str("nested")?;
    enc.list_end()?;
    enc.variant_end()?;
    enc.variant_begin("app")?;
    enc.u32(42)?;
    enc.variant_end()?;
    enc.map_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    let mut map = dec.map()?;
    let mut app = None;
    while let Some((key, mut val)) = map.next()? {
        match key {
            "app" => app = Some(val.u32()?),
            _ => val.skip()?,
        }
    }
    assert_eq!(app, Some(42));
    Ok(())
}

#[test]
fn test_variant_name_and_payload() -> Result<()> {
    let mut enc = Encoder::new();
    enc.variant_begin("Terminated")?;
    enc.bool(false)?;
    enc.variant_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    let (name, mut body) = dec.variant()?;
    assert_eq!(name, "Terminated");
    assert!(!body.bool()?);
    assert_eq!(body.remaining(), 0);
    Ok(())
}

// ============================================================================
//  STRUCTURAL VIOLATIONS
// ============================================================================

#[test]
fn test_map_rejects_bare_values() -> Result<()> {
    let mut enc = Encoder::new();
    enc.map_begin()?;
    assert_eq!(enc.u32(1), Err(Error::InvalidMapEntry));
    Ok(())
}

#[test]
fn test_variant_requires_exactly_one_payload() -> Result<()> {
    let mut enc = Encoder::new();
    enc.variant_begin("empty")?;
    assert_eq!(enc.variant_end(), Err(Error::EmptyVariant));

    enc.bool(true)?;
    assert_eq!(enc.bool(true), Err(Error::TooManyItems(Scope::Variant)));
    enc.variant_end()?;
    enc.into_bytes()?;
    Ok(())
}

#[test]
fn test_scope_mismatch_and_underflow() -> Result<()> {
    let mut enc = Encoder::new();
    assert_eq!(enc.list_end(), Err(Error::ScopeUnderflow));

    enc.list_begin()?;
    assert_eq!(
        enc.map_end(),
        Err(Error::ScopeMismatch { expected: Scope::Map, actual: Scope::List })
    );
    enc.list_end()?;
    Ok(())
}

#[test]
fn test_unfinished_encoder() -> Result<()> {
    let mut enc = Encoder::new();
    enc.list_begin()?;
    assert!(matches!(enc.into_bytes(), Err(Error::ScopeStillOpen)));
    Ok(())
}

#[test]
fn test_container_length_overrun() {
    // declares 10 body bytes but only carries 2
    let bytes = vec![Tag::List as u8, 10, 0, 0, 0, Tag::BoolTrue as u8, Tag::BoolTrue as u8];
    let mut dec = Decoder::new(&bytes);
    assert!(matches!(dec.list(), Err(Error::UnexpectedEnd)));
}
