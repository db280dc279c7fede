//! Display-name derivation for items that only have an editor id
//!
//! Splits the identifier on case and digit boundaries, drops noise tokens,
//! and joins the rest with spaces: `DLCIronSword02Variant` -> `Iron Sword`.
//! Derivations are memoized per identifier.

use ahash::AHashMap;

/// Tokens never worth showing to a player, beyond the family's own
/// type-name token.
const NOISE_TOKENS: [&str; 2] = ["DLC", "Variant"];

pub struct NameDeriver {
    /// The family type-name token to strip, e.g. "Weapon"
    family_token: &'static str,
    /// Name used when the identifier yields nothing usable
    fallback: &'static str,
    cache: AHashMap<String, String>,
}

impl NameDeriver {
    pub fn new(family_token: &'static str, fallback: &'static str) -> Self {
        Self {
            family_token,
            fallback,
            cache: AHashMap::new(),
        }
    }

    pub fn derive(&mut self, editor_id: &str) -> String {
        if let Some(cached) = self.cache.get(editor_id) {
            return cached.clone();
        }

        let tokens: Vec<&str> = split_boundaries(editor_id)
            .into_iter()
            .filter(|t| t.len() > 1)
            .filter(|t| !NOISE_TOKENS.contains(t) && *t != self.family_token)
            .filter(|t| t.parse::<i64>().is_err())
            .collect();

        let name = if tokens.is_empty() {
            self.fallback.to_string()
        } else {
            tokens.join(" ")
        };

        tracing::debug!(editor_id, name, "derived display name");
        self.cache.insert(editor_id.to_string(), name.clone());
        name
    }
}

/// Token boundaries: before the last capital of a capital run followed by
/// lowercase ("HTTPServer" -> "HTTP", "Server"), before a capital after a
/// non-capital, and between alphabetic and non-alphabetic characters.
fn split_boundaries(s: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = s.char_indices().collect();
    let mut cuts = Vec::new();
    for i in 1..chars.len() {
        let (idx, c) = chars[i];
        let (_, prev) = chars[i - 1];
        let next_lower = chars.get(i + 1).map(|&(_, n)| n.is_lowercase()).unwrap_or(false);
        let boundary = (prev.is_uppercase() && c.is_uppercase() && next_lower)
            || (!prev.is_uppercase() && c.is_uppercase())
            || (prev.is_alphabetic() && !c.is_alphabetic());
        if boundary {
            cuts.push(idx);
        }
    }

    let mut tokens = Vec::new();
    let mut start = 0;
    for cut in cuts {
        tokens.push(&s[start..cut]);
        start = cut;
    }
    tokens.push(&s[start..]);
    tokens
}
