use anyhow::{Context, Result};
use std::path::Path;

use rvdecgen::spec::parse_word;

/// A raw little-endian binary mapped at `base`.
#[derive(Debug, Clone)]
pub struct Image {
    pub base: u32,
    pub bytes: Vec<u8>,
}

impl Image {
    /// `(address, word)` for every whole word, stepping by 4 from `base`.
    pub fn words(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.bytes
            .chunks_exact(4)
            .enumerate()
            .map(|(i, c)| (self.base.wrapping_add(4 * i as u32), u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
    }
}

pub fn load_raw_bin(path: &Path, base: u32, skip: usize, len: Option<usize>) -> Result<Image> {
    let file = std::fs::read(path)?;
    anyhow::ensure!(skip <= file.len(), "--skip exceeds file size");
    let mut payload = &file[skip..];
    if let Some(lim) = len {
        anyhow::ensure!(lim <= payload.len(), "--len exceeds remaining file size after skip");
        payload = &payload[..lim];
    }
    Ok(Image { base, bytes: payload.to_vec() })
}

/// Command-line numbers use the instruction-table literal syntax.
pub fn parse_number(s: &str) -> Result<u32> {
    parse_word(s).with_context(|| format!("`{s}` is not a 32-bit number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn numbers_share_table_syntax() {
        assert_eq!(parse_number("0x10").unwrap(), 0x10);
        assert_eq!(parse_number("0x0031_00b3").unwrap(), 0x003100B3);
        assert_eq!(parse_number("0b0110011").unwrap(), 0x33);
        assert_eq!(parse_number("1_000").unwrap(), 1000);
        let err = parse_number("zz").unwrap_err();
        assert!(err.to_string().contains("zz"));
    }

    #[test]
    fn loader_maps_skip_and_len() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("img.bin");
        std::fs::write(&path, [0u8, 1, 2, 3, 4, 5, 6]).unwrap();
        let img = load_raw_bin(&path, 0x1000_0000, 2, Some(5)).unwrap();
        assert_eq!(img.base, 0x1000_0000);
        assert_eq!(img.bytes, vec![2, 3, 4, 5, 6]);
        // trailing partial word is dropped
        let words: Vec<_> = img.words().collect();
        assert_eq!(words, vec![(0x1000_0000, 0x05040302)]);
    }

    #[test]
    fn loader_rejects_oversized_len() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("img.bin");
        std::fs::write(&path, [0u8; 4]).unwrap();
        assert!(load_raw_bin(&path, 0, 0, Some(8)).is_err());
        assert!(load_raw_bin(&path, 0, 5, None).is_err());
    }
}
