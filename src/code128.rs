//! # Code128 Barcode Codec
//!
//! Encodes a text string into a Code128 symbol: a sequence of alternating
//! bar/space runs with a mod-103 checksum and optional quiet zones.
//!
//! The encoder is a pure function of its input: identical `(text, quiet)`
//! arguments always produce identical run sequences.
//!
//! ## Codesets
//!
//! Code128 encodes characters through three codesets:
//!
//! | Codeset | Characters | Density |
//! |---------|------------|---------|
//! | A | control chars, digits, uppercase | 1 char/symbol |
//! | B | digits, uppercase, lowercase, punctuation | 1 char/symbol |
//! | C | digit pairs | 2 chars/symbol |
//!
//! The encoder starts in codeset C for an even-length all-digit input, in A
//! when the first character is a control character, and in B otherwise.
//! Mid-symbol, a character the current codeset cannot express emits a
//! dedicated switch code before its value code.
//!
//! ## Example
//!
//! ```
//! use etiqueta::code128;
//!
//! let symbol = code128::encode("12345", false).unwrap();
//! assert_eq!(symbol.modules, 90); // 7 symbols x 11 modules + 13-module stop
//! assert!(symbol.runs.first().unwrap().bar);
//! ```

use crate::error::EtiquetaError;

/// Quiet zone width in modules, per side. The symbology's minimum.
pub const QUIET_ZONE: u8 = 10;

const CODE_B: u8 = 100;
const CODE_A: u8 = 101;
const START_A: u8 = 103;
const START_B: u8 = 104;
const START_C: u8 = 105;

/// Bar/space run widths for values 0..=105. Each symbol is 11 modules wide:
/// three bars and three spaces, bar first.
const PATTERNS: [[u8; 6]; 106] = [
    [2, 1, 2, 2, 2, 2], // 0
    [2, 2, 2, 1, 2, 2],
    [2, 2, 2, 2, 2, 1],
    [1, 2, 1, 2, 2, 3],
    [1, 2, 1, 3, 2, 2],
    [1, 3, 1, 2, 2, 2],
    [1, 2, 2, 2, 1, 3],
    [1, 2, 2, 3, 1, 2],
    [1, 3, 2, 2, 1, 2],
    [2, 2, 1, 2, 1, 3],
    [2, 2, 1, 3, 1, 2], // 10
    [2, 3, 1, 2, 1, 2],
    [1, 1, 2, 2, 3, 2],
    [1, 2, 2, 1, 3, 2],
    [1, 2, 2, 2, 3, 1],
    [1, 1, 3, 2, 2, 2],
    [1, 2, 3, 1, 2, 2],
    [1, 2, 3, 2, 2, 1],
    [2, 2, 3, 2, 1, 1],
    [2, 2, 1, 1, 3, 2],
    [2, 2, 1, 2, 3, 1], // 20
    [2, 1, 3, 2, 1, 2],
    [2, 2, 3, 1, 1, 2],
    [3, 1, 2, 1, 3, 1],
    [3, 1, 1, 2, 2, 2],
    [3, 2, 1, 1, 2, 2],
    [3, 2, 1, 2, 2, 1],
    [3, 1, 2, 2, 1, 2],
    [3, 2, 2, 1, 1, 2],
    [3, 2, 2, 2, 1, 1],
    [2, 1, 2, 1, 2, 3], // 30
    [2, 1, 2, 3, 2, 1],
    [2, 3, 2, 1, 2, 1],
    [1, 1, 1, 3, 2, 3],
    [1, 3, 1, 1, 2, 3],
    [1, 3, 1, 3, 2, 1],
    [1, 1, 2, 3, 1, 3],
    [1, 3, 2, 1, 1, 3],
    [1, 3, 2, 3, 1, 1],
    [2, 1, 1, 3, 1, 3],
    [2, 3, 1, 1, 1, 3], // 40
    [2, 3, 1, 3, 1, 1],
    [1, 1, 2, 1, 3, 3],
    [1, 1, 2, 3, 3, 1],
    [1, 3, 2, 1, 3, 1],
    [1, 1, 3, 1, 2, 3],
    [1, 1, 3, 3, 2, 1],
    [1, 3, 3, 1, 2, 1],
    [3, 1, 3, 1, 2, 1],
    [2, 1, 1, 3, 3, 1],
    [2, 3, 1, 1, 3, 1], // 50
    [2, 1, 3, 1, 1, 3],
    [2, 1, 3, 3, 1, 1],
    [2, 1, 3, 1, 3, 1],
    [3, 1, 1, 1, 2, 3],
    [3, 1, 1, 3, 2, 1],
    [3, 3, 1, 1, 2, 1],
    [3, 1, 2, 1, 1, 3],
    [3, 1, 2, 3, 1, 1],
    [3, 3, 2, 1, 1, 1],
    [3, 1, 4, 1, 1, 1], // 60
    [2, 2, 1, 4, 1, 1],
    [4, 3, 1, 1, 1, 1],
    [1, 1, 1, 2, 2, 4],
    [1, 1, 1, 4, 2, 2],
    [1, 2, 1, 1, 2, 4],
    [1, 2, 1, 4, 2, 1],
    [1, 4, 1, 1, 2, 2],
    [1, 4, 1, 2, 2, 1],
    [1, 1, 2, 2, 1, 4],
    [1, 1, 2, 4, 1, 2], // 70
    [1, 2, 2, 1, 1, 4],
    [1, 2, 2, 4, 1, 1],
    [1, 4, 2, 1, 1, 2],
    [1, 4, 2, 2, 1, 1],
    [2, 4, 1, 2, 1, 1],
    [2, 2, 1, 1, 1, 4],
    [4, 1, 3, 1, 1, 1],
    [2, 4, 1, 1, 1, 2],
    [1, 3, 4, 1, 1, 1],
    [1, 1, 1, 2, 4, 2], // 80
    [1, 2, 1, 1, 4, 2],
    [1, 2, 1, 2, 4, 1],
    [1, 1, 4, 2, 1, 2],
    [1, 2, 4, 1, 1, 2],
    [1, 2, 4, 2, 1, 1],
    [4, 1, 1, 2, 1, 2],
    [4, 2, 1, 1, 1, 2],
    [4, 2, 1, 2, 1, 1],
    [2, 1, 2, 1, 4, 1],
    [2, 1, 4, 1, 2, 1], // 90
    [4, 1, 2, 1, 2, 1],
    [1, 1, 1, 1, 4, 3],
    [1, 1, 1, 3, 4, 1],
    [1, 3, 1, 1, 4, 1],
    [1, 1, 4, 1, 1, 3],
    [1, 1, 4, 3, 1, 1],
    [4, 1, 1, 1, 1, 3],
    [4, 1, 1, 3, 1, 1],
    [1, 1, 3, 1, 4, 1],
    [1, 1, 4, 1, 3, 1], // 100
    [3, 1, 1, 1, 4, 1],
    [4, 1, 1, 1, 3, 1],
    [2, 1, 1, 4, 1, 2], // Start A
    [2, 1, 1, 2, 1, 4], // Start B
    [2, 1, 1, 2, 3, 2], // Start C
];

/// Stop pattern: four bars and three spaces, 13 modules.
const STOP: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

/// One run of equal-colored modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// True for a bar (ink), false for a space.
    pub bar: bool,
    /// Run width in modules.
    pub width: u8,
}

/// An encoded Code128 symbol as alternating bar/space runs.
///
/// Widths are in abstract modules; physical sizing happens at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeSymbol {
    pub runs: Vec<Run>,
    /// Total width in modules, quiet zones included.
    pub modules: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
}

/// Encode `text` as a Code128 symbol.
///
/// When `quiet` is true the run sequence is wrapped in [`QUIET_ZONE`]-module
/// blank runs on both sides; otherwise the sequence starts and ends on a bar.
///
/// Fails with [`EtiquetaError::InvalidCharacter`] on any non-ASCII character.
/// No character is ever silently dropped.
pub fn encode(text: &str, quiet: bool) -> Result<BarcodeSymbol, EtiquetaError> {
    let values = symbol_values(text)?;

    let mut checksum = u32::from(values[0]);
    for (weight, &value) in values.iter().enumerate().skip(1) {
        checksum += u32::from(value) * weight as u32;
    }
    let check = (checksum % 103) as u8;

    let mut runs = Vec::with_capacity(values.len() * 6 + 9);
    if quiet {
        runs.push(Run {
            bar: false,
            width: QUIET_ZONE,
        });
    }
    for &value in values.iter().chain(std::iter::once(&check)) {
        push_symbol(&mut runs, &PATTERNS[value as usize]);
    }
    push_symbol(&mut runs, &STOP);
    if quiet {
        runs.push(Run {
            bar: false,
            width: QUIET_ZONE,
        });
    }

    let modules = runs.iter().map(|run| u32::from(run.width)).sum();
    Ok(BarcodeSymbol { runs, modules })
}

/// Append one symbol's widths as runs, bar first.
fn push_symbol(runs: &mut Vec<Run>, widths: &[u8]) {
    for (i, &width) in widths.iter().enumerate() {
        runs.push(Run {
            bar: i % 2 == 0,
            width,
        });
    }
}

/// Compute the value codes for `text`: start code, character values, and any
/// codeset switch codes. The checksum and stop are not included.
fn symbol_values(text: &str) -> Result<Vec<u8>, EtiquetaError> {
    if let Some(bad) = text.chars().find(|c| !c.is_ascii()) {
        return Err(EtiquetaError::InvalidCharacter(bad));
    }
    let bytes = text.as_bytes();

    // An even run of digits encodes densest as pairs in codeset C.
    if bytes.len() >= 2 && bytes.len() % 2 == 0 && bytes.iter().all(u8::is_ascii_digit) {
        let mut values = vec![START_C];
        for pair in bytes.chunks_exact(2) {
            values.push((pair[0] - b'0') * 10 + (pair[1] - b'0'));
        }
        return Ok(values);
    }

    let mut set = match bytes.first() {
        Some(&b) if b < 0x20 => CodeSet::A,
        _ => CodeSet::B,
    };
    let mut values = vec![match set {
        CodeSet::A => START_A,
        CodeSet::B => START_B,
    }];

    for &b in bytes {
        // Control chars exist only in A, lowercase and DEL only in B.
        let needed = if b < 0x20 {
            CodeSet::A
        } else if b > 0x5F {
            CodeSet::B
        } else {
            set
        };
        if needed != set {
            values.push(match needed {
                CodeSet::A => CODE_A,
                CodeSet::B => CODE_B,
            });
            set = needed;
        }
        values.push(match set {
            CodeSet::A if b < 0x20 => b + 64,
            _ => b - 0x20,
        });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_digits_odd_length_uses_codeset_b() {
        // '1'..'5' have values 17..21 in codeset B.
        let values = symbol_values("12345").unwrap();
        assert_eq!(values, vec![START_B, 17, 18, 19, 20, 21]);
    }

    #[test]
    fn test_checksum_mod_103() {
        // start B + weighted digit values: (104 + 17 + 36 + 57 + 80 + 105) % 103 = 90
        let symbol = encode("12345", false).unwrap();
        // 7 symbols (start, 5 digits, check) x 6 runs + 7 stop runs
        assert_eq!(symbol.runs.len(), 49);
        // The checksum symbol occupies runs 36..42 and must be value 90's pattern.
        let check_widths: Vec<u8> = symbol.runs[36..42].iter().map(|r| r.width).collect();
        assert_eq!(check_widths, PATTERNS[90].to_vec());
    }

    #[test]
    fn test_total_modules() {
        // 7 symbols x 11 modules + 13-module stop
        let symbol = encode("12345", false).unwrap();
        assert_eq!(symbol.modules, 90);
        let quiet = encode("12345", true).unwrap();
        assert_eq!(quiet.modules, 90 + 2 * u32::from(QUIET_ZONE));
    }

    #[test]
    fn test_even_digits_use_codeset_c() {
        let values = symbol_values("123456").unwrap();
        assert_eq!(values, vec![START_C, 12, 34, 56]);
        // start + 3 pairs + check = 5 symbols, plus stop
        let symbol = encode("123456", false).unwrap();
        assert_eq!(symbol.modules, 5 * 11 + 13);
    }

    #[test]
    fn test_codeset_switching() {
        // 'A','B' in B; '\n' forces A; 'c','d' force B again.
        let values = symbol_values("AB\ncd").unwrap();
        assert_eq!(values, vec![START_B, 33, 34, CODE_A, 74, CODE_B, 67, 68]);
    }

    #[test]
    fn test_control_char_starts_in_codeset_a() {
        let values = symbol_values("\x01HI").unwrap();
        assert_eq!(values, vec![START_A, 65, 40, 41]);
    }

    #[test]
    fn test_quiet_zone_wraps_same_runs() {
        let bare = encode("Label-42", false).unwrap();
        let quiet = encode("Label-42", true).unwrap();
        assert_eq!(
            quiet.runs.first(),
            Some(&Run {
                bar: false,
                width: QUIET_ZONE
            })
        );
        assert_eq!(&quiet.runs[1..quiet.runs.len() - 1], &bare.runs[..]);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let a = encode("Hello World", true).unwrap();
        let b = encode("Hello World", true).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_runs_start_and_end_on_bars() {
        let symbol = encode("xyz", false).unwrap();
        assert!(symbol.runs.first().unwrap().bar);
        assert!(symbol.runs.last().unwrap().bar);
        // Strict alternation throughout.
        for pair in symbol.runs.windows(2) {
            assert_ne!(pair[0].bar, pair[1].bar);
        }
    }

    #[test]
    fn test_non_ascii_is_rejected() {
        match encode("héllo", true) {
            Err(EtiquetaError::InvalidCharacter(c)) => assert_eq!(c, 'é'),
            other => panic!("expected InvalidCharacter, got {other:?}"),
        }
    }

    #[test]
    fn test_every_pattern_is_eleven_modules() {
        for pattern in &PATTERNS {
            assert_eq!(pattern.iter().map(|&w| u32::from(w)).sum::<u32>(), 11);
        }
        assert_eq!(STOP.iter().map(|&w| u32::from(w)).sum::<u32>(), 13);
    }
}
