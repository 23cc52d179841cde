//! Randomness sources
//!
//! The sampler never touches an RNG directly; all randomness flows through a
//! [`RandomnessSource`]. The default [`SeededSource`] is deterministic given a seed
//! and a stream number, so concurrent samples can each draw from their own
//! substream of one master seed.
//!
//! The default source sometimes injects boundary constants (zero, the extremes,
//! an empty string) instead of a uniform draw.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{GenerationConfig, SizeRange};
use crate::descriptor::{ScalarKind, TypeDescriptor, TypeKind};
use crate::error::{GenerationError, GenerationResult};
use crate::value::Value;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Source of random draws for the sampler
pub trait RandomnessSource: fmt::Debug {
    /// Draw a value for a scalar type
    fn next_scalar(&mut self, ty: &TypeDescriptor) -> GenerationResult<Value>;

    /// Draw an integer in `min..=max`
    fn next_int(&mut self, min: usize, max: usize) -> usize;

    /// Draw `true` with probability `p`
    fn next_bool(&mut self, p: f64) -> bool;
}

/// ChaCha-backed source with optional edge-case injection
pub struct SeededSource {
    rng: ChaCha8Rng,
    string_length: SizeRange,
    edge_case_probability: f64,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            string_length: SizeRange::new(0, 10),
            edge_case_probability: 0.0,
        }
    }

    /// Source for stream `stream` of the config's seed
    pub fn substream(config: &GenerationConfig, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        rng.set_stream(stream);
        Self {
            rng,
            string_length: config.string_length,
            edge_case_probability: config.edge_case_probability,
        }
    }

    pub fn with_string_length(mut self, range: SizeRange) -> Self {
        self.string_length = range;
        self
    }

    pub fn with_edge_cases(mut self, probability: f64) -> Self {
        self.edge_case_probability = probability.clamp(0.0, 1.0);
        self
    }

    fn edge_case(&mut self, kind: ScalarKind) -> Option<Value> {
        if self.edge_case_probability <= 0.0 || self.rng.gen::<f64>() >= self.edge_case_probability {
            return None;
        }
        let pool: Vec<Value> = match kind {
            ScalarKind::Bool => return None,
            ScalarKind::I8 => vec![0i8.into(), (-1i8).into(), i8::MIN.into(), i8::MAX.into()],
            ScalarKind::I16 => vec![0i16.into(), (-1i16).into(), i16::MIN.into(), i16::MAX.into()],
            ScalarKind::I32 => vec![0i32.into(), (-1i32).into(), i32::MIN.into(), i32::MAX.into()],
            ScalarKind::I64 => vec![0i64.into(), (-1i64).into(), i64::MIN.into(), i64::MAX.into()],
            ScalarKind::U8 => vec![0u8.into(), u8::MAX.into()],
            ScalarKind::U16 => vec![0u16.into(), u16::MAX.into()],
            ScalarKind::U32 => vec![0u32.into(), u32::MAX.into()],
            ScalarKind::U64 => vec![0u64.into(), u64::MAX.into()],
            ScalarKind::F32 => vec![0.0f32.into(), (-1.0f32).into(), f32::MAX.into(), f32::MIN_POSITIVE.into()],
            ScalarKind::F64 => vec![0.0f64.into(), (-1.0f64).into(), f64::MAX.into(), f64::MIN_POSITIVE.into()],
            ScalarKind::Char => vec!['a'.into(), ' '.into()],
            ScalarKind::String => {
                if self.string_length.min > 0 {
                    return None;
                }
                vec![Value::from("")]
            }
        };
        let index = self.rng.gen_range(0..pool.len());
        Some(pool[index].clone())
    }

    fn uniform(&mut self, kind: ScalarKind) -> Value {
        match kind {
            ScalarKind::Bool => self.rng.gen::<bool>().into(),
            ScalarKind::I8 => self.rng.gen::<i8>().into(),
            ScalarKind::I16 => self.rng.gen::<i16>().into(),
            ScalarKind::I32 => self.rng.gen::<i32>().into(),
            ScalarKind::I64 => self.rng.gen::<i64>().into(),
            ScalarKind::U8 => self.rng.gen::<u8>().into(),
            ScalarKind::U16 => self.rng.gen::<u16>().into(),
            ScalarKind::U32 => self.rng.gen::<u32>().into(),
            ScalarKind::U64 => self.rng.gen::<u64>().into(),
            ScalarKind::F32 => self.rng.gen_range(-1.0e6f32..1.0e6f32).into(),
            ScalarKind::F64 => self.rng.gen_range(-1.0e9f64..1.0e9f64).into(),
            ScalarKind::Char => self.alphabet_char().into(),
            ScalarKind::String => {
                let len = self.next_int(self.string_length.min, self.string_length.max);
                (0..len).map(|_| self.alphabet_char()).collect::<String>().into()
            }
        }
    }

    fn alphabet_char(&mut self) -> char {
        ALPHABET[self.rng.gen_range(0..ALPHABET.len())] as char
    }
}

impl RandomnessSource for SeededSource {
    fn next_scalar(&mut self, ty: &TypeDescriptor) -> GenerationResult<Value> {
        let kind = match &ty.kind {
            TypeKind::Scalar(kind) => *kind,
            _ => {
                return Err(GenerationError::UnsupportedType {
                    type_name: ty.name.clone(),
                })
            }
        };
        Ok(match self.edge_case(kind) {
            Some(value) => value,
            None => self.uniform(kind),
        })
    }

    fn next_int(&mut self, min: usize, max: usize) -> usize {
        if min >= max {
            min
        } else {
            self.rng.gen_range(min..=max)
        }
    }

    fn next_bool(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            false
        } else if p >= 1.0 {
            true
        } else {
            self.rng.gen::<f64>() < p
        }
    }
}

impl fmt::Debug for SeededSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeededSource")
            .field("stream", &self.rng.get_stream())
            .field("string_length", &self.string_length)
            .field("edge_case_probability", &self.edge_case_probability)
            .finish()
    }
}
