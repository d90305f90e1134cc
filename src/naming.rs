//! River name generation.
//!
//! Names are built from a small onset/vowel/coda table with a suffix chosen
//! by river type. The generator is seeded from the run seed, so the same seed
//! names the same rivers the same way.

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::hydrology::{River, RiverType};

/// Offset mixed into the run seed so names do not share a stream with other
/// seeded consumers.
const NAMING_SEED_OFFSET: u64 = 0x5249_5645_524e_414d;

const ONSETS: &[&str] = &[
    "b", "br", "c", "d", "dr", "f", "g", "gl", "h", "k", "l", "m", "n", "r", "s", "sh", "t",
    "th", "v", "w",
];
const VOWELS: &[&str] = &["a", "e", "i", "o", "u", "ae", "ia", "ou"];
const CODAS: &[&str] = &["", "", "l", "n", "r", "s", "th", "nd", "rn", "ll"];

const MAX_NAME_RETRIES: usize = 8;

/// Seeded river namer that never hands out the same name twice.
pub struct RiverNamer {
    rng: ChaCha8Rng,
    used: HashSet<String>,
}

impl RiverNamer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(NAMING_SEED_OFFSET)),
            used: HashSet::new(),
        }
    }

    /// Base word of two or three syllables, capitalized.
    fn base_name(&mut self) -> String {
        let syllables = self.rng.gen_range(2..=3);
        let mut name = String::new();
        for i in 0..syllables {
            name.push_str(ONSETS[self.rng.gen_range(0..ONSETS.len())]);
            name.push_str(VOWELS[self.rng.gen_range(0..VOWELS.len())]);
            if i == syllables - 1 {
                name.push_str(CODAS[self.rng.gen_range(0..CODAS.len())]);
            }
        }
        capitalize(&name)
    }

    /// Full display name for `river`.
    pub fn name_for(&mut self, river: &River) -> String {
        let mut base = self.base_name();
        for attempt in 0..MAX_NAME_RETRIES {
            if !self.used.contains(&base) {
                break;
            }
            base = if attempt + 1 < MAX_NAME_RETRIES {
                self.base_name()
            } else {
                format!("{} {}", base, river.id.0)
            };
        }
        self.used.insert(base.clone());

        if river.is_seasonal {
            return format!("{} Wash", base);
        }
        match river.kind {
            RiverType::Stream => format!("{} Brook", base),
            RiverType::River => format!("{} River", base),
            RiverType::MajorRiver => format!("Great {} River", base),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrology::{Outlet, RiverId};

    fn river(id: u32, kind: RiverType, is_seasonal: bool) -> River {
        River {
            id: RiverId(id),
            cells: vec![1, 0],
            source: 1,
            mouth: 1,
            outlet: Outlet::Ocean,
            parent: None,
            width: 1.0,
            length: 2,
            kind,
            is_seasonal,
            name: String::new(),
            max_discharge: 10,
            mouth_discharge: 10,
        }
    }

    #[test]
    fn test_suffix_by_type() {
        let mut namer = RiverNamer::new(1);
        assert!(namer.name_for(&river(1, RiverType::Stream, false)).ends_with(" Brook"));
        assert!(namer.name_for(&river(2, RiverType::River, false)).ends_with(" River"));
        let major = namer.name_for(&river(3, RiverType::MajorRiver, false));
        assert!(major.starts_with("Great ") && major.ends_with(" River"));
        assert!(namer.name_for(&river(4, RiverType::River, true)).ends_with(" Wash"));
    }

    #[test]
    fn test_same_seed_same_names() {
        let names = |seed| {
            let mut namer = RiverNamer::new(seed);
            (1..=20)
                .map(|i| namer.name_for(&river(i, RiverType::River, false)))
                .collect::<Vec<_>>()
        };
        assert_eq!(names(42), names(42));
        assert_ne!(names(42), names(43));
    }

    #[test]
    fn test_names_unique_and_capitalized() {
        let mut namer = RiverNamer::new(7);
        let mut seen = HashSet::new();
        for i in 1..=300 {
            let name = namer.name_for(&river(i, RiverType::Stream, false));
            assert!(name.chars().next().unwrap().is_uppercase());
            assert!(seen.insert(name), "duplicate river name");
        }
    }
}
