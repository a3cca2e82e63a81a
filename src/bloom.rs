//! Cache-line blocked Bloom filter.
//!
//! Every operation hashes once to pick a 512-bit block (one cache line) and
//! performs all of its bit probes inside that block, so an insert or query
//! touches a single line. Bits are set with atomic OR, which makes inserts
//! and queries safe to run concurrently without locks.
//!
//! # Persisted format
//!
//! Little-endian: `magic(8) | k(4) | blocks(8) | hashes(4) | bits_per_block(4)`
//! followed by the raw block words. Loading validates the magic tag and every
//! parameter and fails with [`KontigError::InvalidFilterFormat`] on mismatch.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::error::KontigError;

/// Bits per block: one 64-byte cache line.
pub const BITS_PER_BLOCK: usize = 512;

const WORDS_PER_BLOCK: usize = BITS_PER_BLOCK / 64;

/// Magic tag opening a persisted filter file.
const MAGIC: &[u8; 8] = b"KONTBBF1";

#[repr(align(64))]
#[derive(Default, Debug)]
struct Block([AtomicU64; WORDS_PER_BLOCK]);

/// A blocked Bloom filter over 64-bit element hashes.
///
/// Sized from an expected element count and a bits-per-element target; the
/// block count is rounded up to a power of two so block selection is a mask.
#[derive(Debug)]
pub struct BlockedBloomFilter {
    blocks: Box<[Block]>,
    block_mask: u64,
    hashes: u32,
    kmer_len: u32,
}

impl BlockedBloomFilter {
    /// Creates a filter for about `n_elems` elements at `bits_per_elem` bits
    /// each. `kmer_len` is recorded for persistence validation.
    pub fn new(n_elems: usize, bits_per_elem: usize, kmer_len: usize) -> Self {
        let want_bits = n_elems.saturating_mul(bits_per_elem).max(BITS_PER_BLOCK);
        let n_blocks = want_bits.div_ceil(BITS_PER_BLOCK).next_power_of_two();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let hashes = (std::f64::consts::LN_2 * bits_per_elem as f64).round().max(1.0) as u32;
        debug!(n_blocks, hashes, "sized blocked Bloom filter");
        Self {
            blocks: (0..n_blocks).map(|_| Block::default()).collect(),
            block_mask: (n_blocks - 1) as u64,
            hashes,
            kmer_len: kmer_len as u32,
        }
    }

    /// Inserts an element hash.
    ///
    /// Returns `true` when the element was definitely absent before (at least
    /// one probed bit was still zero).
    pub fn insert(&self, hash: u64) -> bool {
        let block = &self.blocks[(hash & self.block_mask) as usize];
        let (a, b) = probe_seeds(hash);
        let mut definitely_new = false;
        for i in 0..u64::from(self.hashes) {
            let bit = (a.wrapping_add(i.wrapping_mul(b)) % BITS_PER_BLOCK as u64) as usize;
            let mask = 1u64 << (bit % 64);
            let prev = block.0[bit / 64].fetch_or(mask, Ordering::Relaxed);
            definitely_new |= prev & mask == 0;
        }
        definitely_new
    }

    /// Queries an element hash: `true` means possibly present, `false` means
    /// definitely absent.
    pub fn contains(&self, hash: u64) -> bool {
        let block = &self.blocks[(hash & self.block_mask) as usize];
        let (a, b) = probe_seeds(hash);
        for i in 0..u64::from(self.hashes) {
            let bit = (a.wrapping_add(i.wrapping_mul(b)) % BITS_PER_BLOCK as u64) as usize;
            let mask = 1u64 << (bit % 64);
            if block.0[bit / 64].load(Ordering::Relaxed) & mask == 0 {
                return false;
            }
        }
        true
    }

    /// The number of blocks.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// The number of bit probes per operation.
    pub fn num_hashes(&self) -> u32 {
        self.hashes
    }

    /// Writes the filter to `path` in the persisted format.
    pub fn save(&self, path: &Path) -> Result<(), KontigError> {
        let file = File::create(path).map_err(|e| KontigError::FilterWrite {
            source: e,
            path: path.to_path_buf(),
        })?;
        let mut w = BufWriter::new(file);
        self.write_to(&mut w).map_err(|e| KontigError::FilterWrite {
            source: e,
            path: path.to_path_buf(),
        })
    }

    fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(MAGIC)?;
        w.write_all(&self.kmer_len.to_le_bytes())?;
        w.write_all(&(self.blocks.len() as u64).to_le_bytes())?;
        w.write_all(&self.hashes.to_le_bytes())?;
        w.write_all(&(BITS_PER_BLOCK as u32).to_le_bytes())?;
        for block in self.blocks.iter() {
            for word in &block.0 {
                w.write_all(&word.load(Ordering::Relaxed).to_le_bytes())?;
            }
        }
        w.flush()
    }

    /// Reads a filter from `path`, validating the magic tag and that it was
    /// built for k-mers of length `expected_k`.
    pub fn load(path: &Path, expected_k: usize) -> Result<Self, KontigError> {
        let file = File::open(path).map_err(|e| KontigError::FilterRead {
            source: e,
            path: path.to_path_buf(),
        })?;
        let mut r = BufReader::new(file);
        let bad = |details: String| KontigError::InvalidFilterFormat {
            details,
            path: path.to_path_buf(),
        };
        let io_err = |e: std::io::Error| KontigError::FilterRead {
            source: e,
            path: path.to_path_buf(),
        };

        let mut magic = [0u8; 8];
        r.read_exact(&mut magic).map_err(io_err)?;
        if &magic != MAGIC {
            return Err(bad("bad magic tag (not a kontig Bloom filter)".into()));
        }
        let kmer_len = read_u32(&mut r).map_err(io_err)?;
        if kmer_len as usize != expected_k {
            return Err(bad(format!(
                "k-mer length mismatch: filter has k={kmer_len}, build uses k={expected_k}"
            )));
        }
        let n_blocks = read_u64(&mut r).map_err(io_err)? as usize;
        if n_blocks == 0 || !n_blocks.is_power_of_two() {
            return Err(bad(format!("invalid block count {n_blocks}")));
        }
        let hashes = read_u32(&mut r).map_err(io_err)?;
        if hashes == 0 || hashes as usize > BITS_PER_BLOCK {
            return Err(bad(format!("invalid hash count {hashes}")));
        }
        let bits_per_block = read_u32(&mut r).map_err(io_err)?;
        if bits_per_block as usize != BITS_PER_BLOCK {
            return Err(bad(format!(
                "block size mismatch: file has {bits_per_block} bits, expected {BITS_PER_BLOCK}"
            )));
        }

        let mut blocks = Vec::with_capacity(n_blocks);
        for _ in 0..n_blocks {
            let block = Block::default();
            for word in &block.0 {
                let mut buf = [0u8; 8];
                r.read_exact(&mut buf).map_err(io_err)?;
                word.store(u64::from_le_bytes(buf), Ordering::Relaxed);
            }
            blocks.push(block);
        }
        Ok(Self {
            blocks: blocks.into_boxed_slice(),
            block_mask: (n_blocks - 1) as u64,
            hashes,
            kmer_len,
        })
    }
}

/// In-block probe seeds: a start position and an odd stride, derived from
/// hash bits independent of those used for block selection.
fn probe_seeds(hash: u64) -> (u64, u64) {
    let mixed = splitmix64(hash);
    (hash >> 32, mixed | 1)
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn read_u32<R: Read>(r: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn no_false_negatives() {
        let bbf = BlockedBloomFilter::new(10_000, 14, 31);
        for i in 0..10_000u64 {
            bbf.insert(splitmix64(i));
        }
        for i in 0..10_000u64 {
            assert!(bbf.contains(splitmix64(i)), "element {i} lost");
        }
    }

    #[test]
    fn reinsert_reports_seen() {
        let bbf = BlockedBloomFilter::new(1_000, 14, 31);
        assert!(bbf.insert(42));
        assert!(!bbf.insert(42));
    }

    #[test]
    fn sizing_rounds_to_power_of_two() {
        let bbf = BlockedBloomFilter::new(1_000_000, 14, 31);
        assert!(bbf.num_blocks().is_power_of_two());
        assert!(bbf.num_blocks() * BITS_PER_BLOCK >= 14_000_000);
        // h = round(ln 2 * 14)
        assert_eq!(bbf.num_hashes(), 10);
    }

    #[test]
    fn false_positive_rate_near_theory() {
        let n = 1_000_000u64;
        let bbf = BlockedBloomFilter::new(n as usize, 14, 31);
        for i in 0..n {
            bbf.insert(splitmix64(i));
        }
        let queries = 1_000_000u64;
        let mut false_positives = 0u64;
        for i in 0..queries {
            if bbf.contains(splitmix64(i + (1 << 40))) {
                false_positives += 1;
            }
        }
        let observed = false_positives as f64 / queries as f64;

        // Expected rate for the blocked variant: the per-block rate
        // (1 - e^(-h*j/512))^h averaged over the Poisson block load j.
        let h = f64::from(bbf.num_hashes());
        let lambda = n as f64 / bbf.num_blocks() as f64;
        let mut expected = 0.0;
        let mut pmf = (-lambda).exp();
        for j in 0..400 {
            let jf = f64::from(j);
            if j > 0 {
                pmf *= lambda / jf;
            }
            expected += pmf * (1.0 - (-h * jf / 512.0).exp()).powf(h);
        }
        assert!(
            (observed - expected).abs() <= 0.2 * expected,
            "observed {observed:.6}, expected {expected:.6}"
        );
    }

    #[test]
    fn save_load_roundtrip_byte_identical() {
        let dir = tempdir().unwrap();
        let path_a = dir.path().join("a.bbf");
        let path_b = dir.path().join("b.bbf");

        let bbf = BlockedBloomFilter::new(10_000, 14, 21);
        for i in 0..5_000u64 {
            bbf.insert(splitmix64(i));
        }
        bbf.save(&path_a).unwrap();

        let loaded = BlockedBloomFilter::load(&path_a, 21).unwrap();
        for i in 0..5_000u64 {
            assert!(loaded.contains(splitmix64(i)));
        }
        loaded.save(&path_b).unwrap();

        let bytes_a = std::fs::read(&path_a).unwrap();
        let bytes_b = std::fs::read(&path_b).unwrap();
        assert_eq!(bytes_a, bytes_b);
    }

    #[test]
    fn load_rejects_bad_magic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.bbf");
        std::fs::write(&path, b"NOTABLOOMFILTERATALL").unwrap();
        let err = BlockedBloomFilter::load(&path, 31).unwrap_err();
        assert!(matches!(err, KontigError::InvalidFilterFormat { .. }));
    }

    #[test]
    fn load_rejects_kmer_length_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("k21.bbf");
        let bbf = BlockedBloomFilter::new(100, 14, 21);
        bbf.save(&path).unwrap();
        let err = BlockedBloomFilter::load(&path, 31).unwrap_err();
        match err {
            KontigError::InvalidFilterFormat { details, .. } => {
                assert!(details.contains("k-mer length mismatch"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
