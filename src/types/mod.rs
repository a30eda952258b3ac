// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Wire-level value objects of the credential subsystem.

pub mod coremap;
pub mod cred;
pub mod gres;
pub mod identity;
pub mod netcred;
pub mod nodelist;
pub mod protocol;
#[cfg(feature = "rand")]
#[cfg_attr(docsrs, doc(cfg(feature = "rand")))]
pub mod rand;
pub mod sbcast;
pub mod step;

use packable::{
    error::{UnpackError, UnpackErrorExt},
    packer::Packer,
    unpacker::Unpacker,
    Packable,
};

use crate::error::Error;

pub(crate) const MAX_STRING_LENGTH: usize = 64 * 1024;
pub(crate) const MAX_ARRAY_LENGTH: usize = 1 << 24;

pub(crate) fn pack_string<P: Packer>(s: &str, packer: &mut P) -> Result<(), P::Error> {
    (s.len() as u32).pack(packer)?;
    packer.pack_bytes(s.as_bytes())?;

    Ok(())
}

pub(crate) fn unpack_string<U: Unpacker, const VERIFY: bool>(
    unpacker: &mut U,
) -> Result<String, UnpackError<Error, U::Error>> {
    let len = u32::unpack::<_, VERIFY>(unpacker, &()).coerce()? as usize;

    if VERIFY && len > MAX_STRING_LENGTH {
        return Err(UnpackError::Packable(Error::Decode(format!(
            "string length {len} above maximum"
        ))));
    }

    let mut bytes = vec![0u8; len];
    unpacker.unpack_bytes(&mut bytes)?;

    String::from_utf8(bytes).map_err(|e| UnpackError::Packable(Error::Decode(e.to_string())))
}

pub(crate) fn pack_opt_string<P: Packer>(s: Option<&str>, packer: &mut P) -> Result<(), P::Error> {
    match s {
        None => 0u8.pack(packer),
        Some(s) => {
            1u8.pack(packer)?;
            pack_string(s, packer)
        }
    }
}

pub(crate) fn unpack_opt_string<U: Unpacker, const VERIFY: bool>(
    unpacker: &mut U,
) -> Result<Option<String>, UnpackError<Error, U::Error>> {
    match u8::unpack::<_, VERIFY>(unpacker, &()).coerce()? {
        0 => Ok(None),
        1 => Ok(Some(unpack_string::<_, VERIFY>(unpacker)?)),
        tag => Err(UnpackError::Packable(Error::Decode(format!(
            "invalid option tag {tag}"
        )))),
    }
}

pub(crate) fn pack_slice<T: Packable, P: Packer>(items: &[T], packer: &mut P) -> Result<(), P::Error> {
    (items.len() as u32).pack(packer)?;
    for item in items {
        item.pack(packer)?;
    }

    Ok(())
}

pub(crate) fn unpack_vec<T, U: Unpacker, const VERIFY: bool>(
    unpacker: &mut U,
    visitor: &T::UnpackVisitor,
) -> Result<Vec<T>, UnpackError<Error, U::Error>>
where
    T: Packable,
    Error: From<T::UnpackError>,
{
    let len = u32::unpack::<_, VERIFY>(unpacker, &()).coerce()? as usize;

    if VERIFY && len > MAX_ARRAY_LENGTH {
        return Err(UnpackError::Packable(Error::Decode(format!(
            "array length {len} above maximum"
        ))));
    }

    let mut items = Vec::with_capacity(len.min(1024));
    for _ in 0..len {
        items.push(T::unpack::<_, VERIFY>(unpacker, visitor).coerce()?);
    }

    Ok(items)
}

pub(crate) fn pack_bytes_prefixed<P: Packer>(bytes: &[u8], packer: &mut P) -> Result<(), P::Error> {
    (bytes.len() as u32).pack(packer)?;
    packer.pack_bytes(bytes)?;

    Ok(())
}

pub(crate) fn unpack_bytes_prefixed<U: Unpacker, const VERIFY: bool>(
    unpacker: &mut U,
    max_len: usize,
) -> Result<Vec<u8>, UnpackError<Error, U::Error>> {
    let len = u32::unpack::<_, VERIFY>(unpacker, &()).coerce()? as usize;

    if VERIFY && len > max_len {
        return Err(UnpackError::Packable(Error::Decode(format!(
            "byte blob length {len} above maximum"
        ))));
    }

    let mut bytes = vec![0u8; len];
    unpacker.unpack_bytes(&mut bytes)?;

    Ok(bytes)
}
