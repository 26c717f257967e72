//! Residues coprime to a modulus, and the character selection built on them.
//!
//! Characters mod q are addressed by a dense 1-based index into the ascending
//! list of residues k in [1, q] with gcd(k, q) = 1. Index 1 is always the
//! principal character.

use std::fmt;

/// Moduli above this are enumerated with a warning; the list is built on the
/// UI thread in O(q).
pub const LARGE_MODULUS: u64 = 1_000_000;

/// How a residue is presented in the character list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidueKind {
    /// k = 1
    Principal,
    /// k = q - 1 for q > 2
    MinusOne,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    /// 1-based dense index
    pub index: usize,
    pub k: u64,
    pub kind: ResidueKind,
}

impl Residue {
    pub fn label(&self) -> String {
        match self.kind {
            ResidueKind::Principal => format!("{} (Principal)", self.k),
            ResidueKind::MinusOne | ResidueKind::Generic => self.k.to_string(),
        }
    }
}

impl fmt::Display for Residue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Euler's totient, by trial division.
pub fn totient(q: u64) -> u64 {
    let mut n = q.max(1);
    let mut result = n;
    let mut p = 2;
    while p * p <= n {
        if n % p == 0 {
            while n % p == 0 {
                n /= p;
            }
            result -= result / p;
        }
        p += 1;
    }
    if n > 1 {
        result -= result / n;
    }
    result
}

/// Coerce user text into a modulus.
///
/// Non-numeric input and anything below 1 become 1. Decimal input is
/// truncated toward zero.
pub fn parse_modulus(input: &str) -> u64 {
    let trimmed = input.trim();
    let parsed = trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| {
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v.trunc() as i64)
        });
    match parsed {
        Some(q) if q >= 1 => q as u64,
        _ => {
            log::warn!("modulus input {:?} clamped to 1", input);
            1
        }
    }
}

/// Enumerate the residues coprime to `q`, in ascending order of k.
pub fn enumerate(q: u64) -> Vec<Residue> {
    let q = q.max(1);
    if is_large_modulus(q) {
        log::warn!("enumerating residues for large modulus {}", q);
    }
    (1..=q)
        .filter(|&k| gcd(k, q) == 1)
        .enumerate()
        .map(|(i, k)| {
            let kind = if k == 1 {
                ResidueKind::Principal
            } else if q > 2 && k == q - 1 {
                ResidueKind::MinusOne
            } else {
                ResidueKind::Generic
            };
            Residue {
                index: i + 1,
                k,
                kind,
            }
        })
        .collect()
}

pub fn is_large_modulus(q: u64) -> bool {
    q > LARGE_MODULUS
}

/// The character list for the current modulus and the selected entry in it.
#[derive(Debug, Clone)]
pub struct CharacterSelector {
    modulus: u64,
    residues: Vec<Residue>,
    selected: usize,
}

impl CharacterSelector {
    pub fn new(modulus: u64) -> Self {
        let modulus = modulus.max(1);
        Self {
            modulus,
            residues: enumerate(modulus),
            selected: 1,
        }
    }

    /// Regenerate the list for a new modulus.
    ///
    /// The selected index survives when it still exists in the new list,
    /// otherwise selection falls back to the principal character.
    pub fn set_modulus(&mut self, modulus: u64) {
        let modulus = modulus.max(1);
        self.modulus = modulus;
        self.residues = enumerate(modulus);
        if self.selected > self.residues.len() {
            log::debug!(
                "character {} not available mod {}, reset to 1",
                self.selected,
                modulus
            );
            self.selected = 1;
        }
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Selected 1-based index.
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_residue(&self) -> Option<&Residue> {
        self.residues.get(self.selected.wrapping_sub(1))
    }

    /// Select by 1-based index. Returns false and leaves the selection alone
    /// when the index is out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= 1 && index <= self.residues.len() {
            self.selected = index;
            true
        } else {
            false
        }
    }

    /// Move forward one entry. Clamped at the end; returns whether it moved.
    pub fn select_next(&mut self) -> bool {
        self.select(self.selected + 1)
    }

    /// Move back one entry. Clamped at the start; returns whether it moved.
    pub fn select_prev(&mut self) -> bool {
        self.selected > 1 && self.select(self.selected - 1)
    }
}
