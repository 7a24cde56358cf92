//! Textual IP address validation.
//!
//! IPv6 validity is the union of a fixed family of anchored matchers, one per
//! shorthand shape (see [`Ipv6Shape`]). Every token maps to exactly one
//! [`AddressKind`]; nothing here can fail.

use regex::{Regex, RegexSet};
use std::{fmt, sync::LazyLock};

/// Longest valid token: `xxxx:xxxx:xxxx:xxxx:xxxx:xxxx:255.255.255.255`.
pub const MAX_ADDRESS_LEN: usize = 45;

const HEX_GROUP: &str = "[0-9A-Fa-f]{1,4}";
// Up to three digits, value 0-255. `\d` would also match non-ASCII digits.
const IPV4_OCTET: &str = "(?:25[0-5]|2[0-4][0-9]|[01]?[0-9]?[0-9])";

/// Groups allowed on either side of `::` in total, without an IPv4 tail.
const MAX_COMPRESSED_GROUPS: u8 = 7;
/// Same, when the last two groups are written as an IPv4 tail.
const MAX_COMPRESSED_GROUPS_WITH_IPV4: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    Ipv4,
    Ipv6,
    Invalid,
}

impl AddressKind {
    #[must_use]
    pub fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
            Self::Invalid => "invalid",
        })
    }
}

/// Structural family of an accepted IPv6 token.
///
/// `leading` counts the hex groups written before `::`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ipv6Shape {
    /// Eight hex groups, no compression.
    Full,
    /// Six hex groups followed by a dotted IPv4 tail.
    FullWithIpv4,
    /// `leading` groups, `::`, then up to `7 - leading` groups.
    Compressed { leading: u8 },
    /// `leading` groups, `::`, up to `5 - leading` groups, then an IPv4 tail.
    CompressedWithIpv4 { leading: u8 },
}

/// Every IPv6 matcher, in the order they are compiled into the set.
pub const IPV6_SHAPES: [Ipv6Shape; 16] = [
    Ipv6Shape::Full,
    Ipv6Shape::FullWithIpv4,
    Ipv6Shape::Compressed { leading: 0 },
    Ipv6Shape::Compressed { leading: 1 },
    Ipv6Shape::Compressed { leading: 2 },
    Ipv6Shape::Compressed { leading: 3 },
    Ipv6Shape::Compressed { leading: 4 },
    Ipv6Shape::Compressed { leading: 5 },
    Ipv6Shape::Compressed { leading: 6 },
    Ipv6Shape::Compressed { leading: 7 },
    Ipv6Shape::CompressedWithIpv4 { leading: 0 },
    Ipv6Shape::CompressedWithIpv4 { leading: 1 },
    Ipv6Shape::CompressedWithIpv4 { leading: 2 },
    Ipv6Shape::CompressedWithIpv4 { leading: 3 },
    Ipv6Shape::CompressedWithIpv4 { leading: 4 },
    Ipv6Shape::CompressedWithIpv4 { leading: 5 },
];

impl Ipv6Shape {
    /// Anchored regular expression accepting exactly this shape.
    #[must_use]
    pub fn pattern(self) -> String {
        let ipv4 = ipv4_body();
        match self {
            Self::Full => format!("^{HEX_GROUP}(?::{HEX_GROUP}){{7}}$"),
            Self::FullWithIpv4 => format!("^(?:{HEX_GROUP}:){{6}}{ipv4}$"),
            Self::Compressed { leading } => {
                let trailing = MAX_COMPRESSED_GROUPS.saturating_sub(leading);
                let right = if trailing == 0 {
                    String::new()
                } else {
                    format!(
                        "(?:{HEX_GROUP}{})?",
                        repeat(&format!(":{HEX_GROUP}"), 0, trailing - 1)
                    )
                };
                format!("^{}::{right}$", leading_groups(leading))
            }
            Self::CompressedWithIpv4 { leading } => {
                let trailing = MAX_COMPRESSED_GROUPS_WITH_IPV4.saturating_sub(leading);
                format!(
                    "^{}::{}{ipv4}$",
                    leading_groups(leading),
                    repeat(&format!("{HEX_GROUP}:"), 0, trailing)
                )
            }
        }
    }
}

fn ipv4_body() -> String {
    format!(r"{IPV4_OCTET}(?:\.{IPV4_OCTET}){{3}}")
}

/// `count` colon-separated hex groups, or nothing.
fn leading_groups(count: u8) -> String {
    if count == 0 {
        return String::new();
    }
    format!("{HEX_GROUP}{}", repeat(&format!(":{HEX_GROUP}"), count - 1, count - 1))
}

/// `piece` repeated between `min` and `max` times; empty when `max` is zero.
fn repeat(piece: &str, min: u8, max: u8) -> String {
    match (min, max) {
        (_, 0) => String::new(),
        (min, max) if min == max => format!("(?:{piece}){{{max}}}"),
        (min, max) => format!("(?:{piece}){{{min},{max}}}"),
    }
}

static IPV4_MATCHER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{}$", ipv4_body())).expect("IPv4 pattern should compile")
});

static IPV6_MATCHERS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(IPV6_SHAPES.iter().map(|shape| shape.pattern()))
        .expect("IPv6 shape patterns should compile")
});

/// Classifies `token` as an IPv4 address, an IPv6 address, or neither.
///
/// IPv4 is tried first. The whole token must match; surrounding whitespace is
/// not stripped.
#[must_use]
pub fn validate(token: &str) -> AddressKind {
    if token.len() > MAX_ADDRESS_LEN {
        AddressKind::Invalid
    } else if IPV4_MATCHER.is_match(token) {
        AddressKind::Ipv4
    } else if IPV6_MATCHERS.is_match(token) {
        AddressKind::Ipv6
    } else {
        AddressKind::Invalid
    }
}

#[must_use]
pub fn is_valid(token: &str) -> bool {
    validate(token).is_valid()
}

/// Returns every IPv6 shape that accepts `token` in its entirety.
#[must_use]
pub fn ipv6_shapes(token: &str) -> Vec<Ipv6Shape> {
    if token.len() > MAX_ADDRESS_LEN {
        return Vec::new();
    }
    IPV6_MATCHERS
        .matches(token)
        .into_iter()
        .map(|index| IPV6_SHAPES[index])
        .collect()
}
