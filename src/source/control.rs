//! Control entries.
//!
//! Control entries are the lines of a zonefile starting with a dollar sign.
//! The reader understands `$ORIGIN`, `$TTL`, and `$INCLUDE`.

use super::entry::Tokens;
use super::error::ParseErrorKind;
use bytes::Bytes;
use domain::base::Name;
use std::str::{self, FromStr};

//------------ Control -------------------------------------------------------

/// A scanned control entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Control<'a> {
    /// `$ORIGIN`, with the raw new origin.
    Origin(&'a [u8]),

    /// `$TTL`, with the new default TTL in seconds.
    Ttl(u32),

    /// `$INCLUDE`, with the raw path and optional raw origin.
    Include {
        path: &'a [u8],
        origin: Option<&'a [u8]>,
    },
}

impl<'a> Control<'a> {
    /// Scans a control entry.
    ///
    /// The entry is expected to start with the dollar sign.
    pub fn scan(entry: &'a [u8]) -> Result<Self, ParseErrorKind> {
        let mut tokens = Tokens::new(entry).map(|(token, _)| token);
        let ctrl = tokens.next().unwrap_or_default();
        if ctrl.eq_ignore_ascii_case(b"$ORIGIN") {
            tokens
                .next()
                .map(Control::Origin)
                .ok_or(ParseErrorKind::MissingArgument("$ORIGIN"))
        } else if ctrl.eq_ignore_ascii_case(b"$TTL") {
            let ttl = tokens
                .next()
                .ok_or(ParseErrorKind::MissingArgument("$TTL"))?;
            str::from_utf8(ttl)
                .ok()
                .and_then(|ttl| u32::from_str(ttl).ok())
                .map(Control::Ttl)
                .ok_or(ParseErrorKind::BadTtl)
        } else if ctrl.eq_ignore_ascii_case(b"$INCLUDE") {
            let path = tokens
                .next()
                .ok_or(ParseErrorKind::MissingArgument("$INCLUDE"))?;
            Ok(Control::Include {
                path,
                origin: tokens.next(),
            })
        } else {
            Err(ParseErrorKind::UnknownControl(
                String::from_utf8_lossy(ctrl).into_owned(),
            ))
        }
    }
}

//------------ scan_name -----------------------------------------------------

/// Converts a name given in a control entry into an absolute name.
///
/// Relative names are made absolute by appending `origin`. A single `@`
/// stands for the origin itself.
pub fn scan_name(
    token: &[u8],
    origin: Option<&Name<Bytes>>,
) -> Result<Name<Bytes>, ParseErrorKind> {
    let token = str::from_utf8(token)
        .map_err(|_| ParseErrorKind::BadOrigin("not ASCII".into()))?;
    if token == "@" {
        return origin.cloned().ok_or(ParseErrorKind::MissingOrigin);
    }
    let res = if token.ends_with('.') {
        Name::from_str(token)
    } else {
        match origin {
            Some(origin) if origin.is_root() => {
                Name::from_str(&format!("{}.", token))
            }
            Some(origin) => Name::from_str(&format!("{}.{}.", token, origin)),
            None => return Err(ParseErrorKind::MissingOrigin),
        }
    };
    res.map_err(|err| ParseErrorKind::BadOrigin(err.to_string()))
}

//============ Tests =========================================================
