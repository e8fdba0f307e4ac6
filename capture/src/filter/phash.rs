use std::fmt;

use frame_sieve_common::config::HashAlgorithm;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};

use crate::error::HashError;

/// Side of the luma image fed to the DCT is `hash_size * HIGHFREQ_FACTOR`.
const HIGHFREQ_FACTOR: u32 = 4;
/// Bounds for a configured `hash_size`. The DCT table is `(4 * hash_size)^2`.
const MIN_HASH_SIZE: u32 = 2;
const MAX_HASH_SIZE: u32 = 64;

/// A fixed-length binary fingerprint of an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PerceptualHash {
    bits: Vec<bool>,
}

impl PerceptualHash {
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of differing bits. A length mismatch counts as differing bits.
    pub fn distance(&self, other: &Self) -> u32 {
        let common = hamming(&self.bits, &other.bits);
        common + self.bits.len().abs_diff(other.bits.len()) as u32
    }
}

impl fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for nibble in self.bits.chunks(4) {
            let v = nibble
                .iter()
                .fold(0u8, |acc, &b| (acc << 1) | u8::from(b));
            write!(f, "{v:x}")?;
        }
        Ok(())
    }
}

/// Compute the hamming distance between two binary hashes.
pub fn hamming(a: &[bool], b: &[bool]) -> u32 {
    a.iter().zip(b.iter()).filter(|(a, b)| a != b).count() as u32
}

/// Turns images into [`PerceptualHash`]es.
///
/// Both algorithms are implemented directly on top of `image` so no hashing
/// crate has to agree with our `image` version.
#[derive(Debug, Clone, Copy)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    hash_size: u32,
}

impl Hasher {
    pub fn new(algorithm: HashAlgorithm, hash_size: u32) -> Self {
        Self {
            algorithm,
            hash_size: hash_size.clamp(MIN_HASH_SIZE, MAX_HASH_SIZE),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn hash_size(&self) -> u32 {
        self.hash_size
    }

    /// Decode encoded image bytes (PNG from a screenshot, typically) and hash them.
    pub fn hash_bytes(&self, data: &[u8]) -> Result<PerceptualHash, HashError> {
        let img = image::load_from_memory(data)?;
        self.hash_image(&img)
    }

    pub fn hash_image(&self, img: &DynamicImage) -> Result<PerceptualHash, HashError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(HashError::Empty);
        }
        Ok(match self.algorithm {
            HashAlgorithm::Phash => dct_hash(img, self.hash_size),
            HashAlgorithm::Ahash => average_hash(img, self.hash_size),
        })
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new(HashAlgorithm::Phash, 8)
    }
}

/// aHash: grayscale, resize to hash_size², 1 where pixel > mean.
fn average_hash(img: &DynamicImage, hash_size: u32) -> PerceptualHash {
    let gray = img
        .resize_exact(hash_size, hash_size, FilterType::Nearest)
        .to_luma8();

    let pixels: Vec<u8> = gray.pixels().map(|p| p.0[0]).collect();
    let mean: f64 = pixels.iter().map(|&p| p as f64).sum::<f64>() / pixels.len() as f64;
    let bits = pixels.iter().map(|&p| p as f64 > mean).collect();
    PerceptualHash { bits }
}

/// pHash: grayscale at (4·hash_size)², 2-D DCT-II, keep the top-left
/// hash_size² low-frequency block, 1 where coefficient > block median.
fn dct_hash(img: &DynamicImage, hash_size: u32) -> PerceptualHash {
    let side = hash_size * HIGHFREQ_FACTOR;
    let gray: GrayImage = img
        .resize_exact(side, side, FilterType::Lanczos3)
        .to_luma8();

    let n = side as usize;
    let pixels: Vec<f64> = gray.pixels().map(|p| p.0[0] as f64).collect();
    let coeffs = dct_2d(&pixels, n);

    let k = hash_size as usize;
    let low: Vec<f64> = (0..k)
        .flat_map(|row| coeffs[row * n..row * n + k].iter().copied())
        .collect();
    let med = median(&low);
    let bits = low.iter().map(|&c| c > med).collect();
    PerceptualHash { bits }
}

/// Unnormalized separable DCT-II over an n×n row-major block.
fn dct_2d(input: &[f64], n: usize) -> Vec<f64> {
    let table: Vec<f64> = (0..n)
        .flat_map(|k| {
            (0..n).map(move |i| {
                (std::f64::consts::PI * (2 * i + 1) as f64 * k as f64 / (2 * n) as f64).cos()
            })
        })
        .collect();

    // Rows first, then columns.
    let mut rows = vec![0.0; n * n];
    for r in 0..n {
        let line = &input[r * n..(r + 1) * n];
        for k in 0..n {
            let basis = &table[k * n..(k + 1) * n];
            rows[r * n + k] = 2.0 * line.iter().zip(basis).map(|(x, c)| x * c).sum::<f64>();
        }
    }

    let mut out = vec![0.0; n * n];
    for c in 0..n {
        for k in 0..n {
            let basis = &table[k * n..(k + 1) * n];
            let mut acc = 0.0;
            for (r, b) in basis.iter().enumerate() {
                acc += rows[r * n + c] * b;
            }
            out[k * n + c] = 2.0 * acc;
        }
    }
    out
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
