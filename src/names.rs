//! Deterministic fancy-name generation for the `obscure` command.

use std::collections::HashMap;

const COLORS: &str = "Amber Amethyst Argent Azure Beige Brown Celadon Cerise \
Cerulean Cobalt Copper Coral Crimson Ebony Emerald Fuchsia Gold Indigo Ivory \
Jade Khaki";

// Kept at an odd count: the noun ring is walked at stride two, which only
// covers the full color x noun product when its length is odd.
const NOUNS: &str = "Angel Axe Bear Beacon Bell Bridge Candle Castle Cloud \
Comet Crown Dagger Dragon Eagle Falcon Flute Forest Garden Hammer Harbor \
Island";

/// An infinite sequence of readable replacement names.
///
/// Names are drawn from the Cartesian product of a color ring and a noun
/// ring; the rings advance at different strides so consecutive names share
/// neither part. Once the product is exhausted an integer suffix is added
/// and the walk restarts. The mapping from input token to name is memoized,
/// so a token always obscures to the same name within one run.
pub struct NameSequence {
    colors: Vec<String>,
    nouns: Vec<String>,
    seq: usize,
    memo: HashMap<String, String>,
}

impl Default for NameSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl NameSequence {
    /// Creates a sequence over the built-in color and noun rings.
    pub fn new() -> Self {
        NameSequence {
            colors: COLORS.split_whitespace().map(str::to_string).collect(),
            nouns: NOUNS.split_whitespace().map(str::to_string).collect(),
            seq: 0,
            memo: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_rings(colors: &[&str], nouns: &[&str]) -> Self {
        NameSequence {
            colors: colors.iter().map(|s| s.to_string()).collect(),
            nouns: nouns.iter().map(|s| s.to_string()).collect(),
            seq: 0,
            memo: HashMap::new(),
        }
    }

    /// Returns the consistent fancy name for `token`, generating a fresh one
    /// on first sight.
    pub fn obscure_token(&mut self, token: &str) -> String {
        if let Some(name) = self.memo.get(token) {
            return name.clone();
        }
        let name = self.next_name();
        self.memo.insert(token.to_string(), name.clone());
        name
    }

    fn next_name(&mut self) -> String {
        let nc = self.colors.len();
        let nn = self.nouns.len();
        let seq = self.seq;
        self.seq += 1;
        let color = &self.colors[seq % nc];
        // The noun ring advances by two per color lap, offset by the color
        // cursor's parity, so neighbors in the sequence differ in both
        // halves.
        let noun = &self.nouns[(2 * (seq / nc) + (seq % nc) % 2) % nn];
        let round = seq / (nc * nn);
        if round > 0 {
            format!("{color}{noun}{round}")
        } else {
            format!("{color}{noun}")
        }
    }
}
