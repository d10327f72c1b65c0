//! High-entropy placeholder tokens substituted for markup regions.

use std::collections::HashSet;

use rand::Rng;

const ALIAS_LEN: usize = 32;
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Issues aliases that are unique per generator and absent from a given text.
#[derive(Debug, Default)]
pub struct AliasGenerator {
    issued: HashSet<String>,
}

impl AliasGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a fresh alias that does not occur in `avoid` and was never issued.
    pub fn fresh<R: Rng + ?Sized>(&mut self, rng: &mut R, avoid: &str) -> String {
        loop {
            let alias = random_token(rng);
            if avoid.contains(&alias) || self.issued.contains(&alias) {
                continue;
            }
            self.issued.insert(alias.clone());
            return alias;
        }
    }
}

fn random_token<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ALIAS_LEN)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}
