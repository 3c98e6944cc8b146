/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::borrow::Cow;
use std::fmt::Write;

pub mod predefined {
    pub const LT: &str = "&lt;";
    pub const GT: &str = "&gt;";
    pub const AMP: &str = "&amp;";
    pub const APOS: &str = "&apos;";
    pub const QUOT: &str = "&quot;";
}

fn replacement(c: char) -> Option<&'static str> {
    match c {
        '<' => Some(predefined::LT),
        '>' => Some(predefined::GT),
        '&' => Some(predefined::AMP),
        '\'' => Some(predefined::APOS),
        '"' => Some(predefined::QUOT),
        _ => None,
    }
}

pub fn escaped_size(s: &str) -> usize {
    s.chars()
        .map(|c| replacement(c).map_or(c.len_utf8(), str::len))
        .sum()
}

/// Escapes the five predefined XML entities in the given text.
///
/// Returns the input unchanged when no escaping is needed.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.chars().any(|c| replacement(c).is_some()) {
        return Cow::Borrowed(s);
    }
    let mut escaped = String::with_capacity(escaped_size(s));
    for c in s.chars() {
        match replacement(c) {
            Some(entity) => escaped.push_str(entity),
            None => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

pub fn escape_fmt(s: &str, f: &mut impl Write) -> std::fmt::Result {
    let mut start = 0;
    for (pos, c) in s.char_indices() {
        if let Some(entity) = replacement(c) {
            f.write_str(&s[start..pos])?;
            f.write_str(entity)?;
            start = pos + 1;
        }
    }
    f.write_str(&s[start..])
}
