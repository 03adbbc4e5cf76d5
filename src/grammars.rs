//! Sample grammars bundled with the crate

/// A small ATIS-style flight booking grammar with start symbol `TOP`
pub const FLIGHTS: &str = include_str!("../grammars/flights.pcfg");

/// A grammar where local-rule and joint scoring pick different trees for
/// `a b c`
pub const ATTACHMENT: &str = include_str!("../grammars/attachment.pcfg");
