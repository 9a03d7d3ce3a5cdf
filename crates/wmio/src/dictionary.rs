//! Compact string dictionary
//!
//! Well-known qualifier and property names are not stored on the heap: a
//! reference with bit 31 set carries an index into this fixed table instead.

/// Bit marking a reference as a dictionary index
pub const DICTIONARY_FLAG: u32 = 1 << 31;

/// The dictionary, indexed by reference value with [`DICTIONARY_FLAG`] cleared
pub const DICTIONARY: [&str; 11] = [
    "\"",
    "key",
    "\"\"",
    "read",
    "write",
    "volatile",
    "provider",
    "dynamic",
    "cimwin32",
    "DWORD",
    "CIMTYPE",
];

/// Resolve a dictionary reference
///
/// The flag bit is ignored; `None` if the index is outside the table.
pub fn lookup(reference: u32) -> Option<&'static str> {
    DICTIONARY
        .get((reference & !DICTIONARY_FLAG) as usize)
        .copied()
}

/// Find the dictionary reference for `word`, flag bit included
pub fn reverse_lookup(word: &str) -> Option<u32> {
    DICTIONARY
        .iter()
        .position(|w| *w == word)
        .map(|i| i as u32 | DICTIONARY_FLAG)
}
