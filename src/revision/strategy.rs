//! Finding the string payload in a keyed-archiver `$objects` array.
//!
//! Two tiers, tried in order:
//! 1. [`LookupStrategy::ConventionalKey`]: a dictionary holding `NS.string`
//!    (how `NSMutableString` is archived)
//! 2. [`LookupStrategy::KeyContainsString`]: any dictionary key containing
//!    "string", case-insensitive
//!
//! Within a tier the first matching object wins. Later objects are never
//! touched, even if they hold string payloads of their own.

use plist::{Dictionary, Value};

/// Key under which `NSKeyedArchiver` stores mutable string contents.
pub const CONVENTIONAL_KEY: &str = "NS.string";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    /// Exact `NS.string` key
    ConventionalKey,
    /// First key whose name contains "string" (any case)
    KeyContainsString,
}

impl LookupStrategy {
    /// All tiers in the order they are tried.
    pub const TIERS: [LookupStrategy; 2] = [
        LookupStrategy::ConventionalKey,
        LookupStrategy::KeyContainsString,
    ];

    /// Key of `dict` this strategy would replace, if any.
    pub fn key_in(self, dict: &Dictionary) -> Option<String> {
        match self {
            LookupStrategy::ConventionalKey => dict
                .contains_key(CONVENTIONAL_KEY)
                .then(|| CONVENTIONAL_KEY.to_string()),
            LookupStrategy::KeyContainsString => dict
                .keys()
                .find(|k| k.to_lowercase().contains("string"))
                .cloned(),
        }
    }

    /// First object in `objects` this strategy matches.
    pub fn scan(self, objects: &[Value]) -> Option<PayloadSlot> {
        objects.iter().enumerate().find_map(|(index, object)| {
            let key = self.key_in(object.as_dictionary()?)?;
            Some(PayloadSlot {
                index,
                key,
                strategy: self,
            })
        })
    }
}

/// Where the active string lives: `$objects[index][key]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSlot {
    pub index: usize,
    pub key: String,
    pub strategy: LookupStrategy,
}

/// Run the tiers in order and return the first hit.
pub fn find_payload(objects: &[Value]) -> Option<PayloadSlot> {
    LookupStrategy::TIERS
        .iter()
        .find_map(|strategy| strategy.scan(objects))
}
