//! Configuration for the tracking heaps that back memory spaces without a native allocator.
//!
//! The process-wide `Device` and `Unified` heaps read their configuration from the environment
//! the first time they are used:
//!
//! | variable | meaning |
//! |---|---|
//! | `DEVALLOC_DEVICE_HEAP_LIMIT` | maximum live bytes; further requests fail with `OutOfMemory` |
//! | `DEVALLOC_DEVICE_HEAP_INIT` | `uninit`, `zero`, or a byte (`171`, `0xAB`) new blocks are filled with |
//!
//! and likewise with `UNIFIED` in place of `DEVICE`. Heaps created directly take a
//! [`HeapConfig`] built in code.

use log::warn;
use std::env;

/// How newly allocated memory is filled before it is handed out.
#[derive(Clone, Copy, Default, Debug, Eq, PartialEq)]
pub enum AllocInit {
    /// The memory is returned as-is. Reading it before writing is undefined behavior.
    #[default]
    Uninitialized,

    /// Memory is filled with zeros.
    Zeroed,

    /// Memory is filled with a repetition of the given byte.
    Data(u8),
}

impl AllocInit {
    /// The fill byte, if any.
    pub fn fill_byte(self) -> Option<u8> {
        match self {
            AllocInit::Uninitialized => None,
            AllocInit::Zeroed => Some(0),
            AllocInit::Data(byte) => Some(byte),
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "uninit" | "uninitialized" => Some(AllocInit::Uninitialized),
            "zero" | "zeroed" => Some(AllocInit::Zeroed),
            other => parse_byte(other).map(AllocInit::Data),
        }
    }
}

fn parse_byte(raw: &str) -> Option<u8> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

/// Settings for a [`SpaceHeap`](../memory/struct.SpaceHeap.html).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HeapConfig {
    /// Maximum number of live bytes. `None` means limited only by host memory.
    pub limit: Option<usize>,

    /// How new blocks are filled.
    pub init: AllocInit,

    /// Byte written over blocks as they are freed, to make use-after-free visible.
    pub poison_on_free: Option<u8>,
}

impl HeapConfig {
    /// Caps the heap at `bytes` live bytes.
    pub fn with_limit(mut self, bytes: usize) -> Self {
        self.limit = Some(bytes);
        self
    }

    /// Sets how new blocks are filled.
    pub fn with_init(mut self, init: AllocInit) -> Self {
        self.init = init;
        self
    }

    /// Overwrites freed blocks with `byte`.
    pub fn with_poison(mut self, byte: u8) -> Self {
        self.poison_on_free = Some(byte);
        self
    }

    /// Reads `DEVALLOC_<SPACE>_HEAP_LIMIT` and `DEVALLOC_<SPACE>_HEAP_INIT`.
    ///
    /// Unset variables keep their defaults; malformed ones are logged and ignored.
    pub fn from_env(space: &str) -> Self {
        Self::from_lookup(space, |key| env::var(key).ok())
    }

    fn from_lookup<F>(space: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = format!("DEVALLOC_{}_HEAP", space.to_ascii_uppercase());
        let mut config = HeapConfig::default();

        let limit_key = format!("{}_LIMIT", prefix);
        if let Some(raw) = lookup(&limit_key) {
            match raw.trim().parse::<usize>() {
                Ok(bytes) => config.limit = Some(bytes),
                Err(_) => warn!("ignoring {}={:?}: not a byte count", limit_key, raw),
            }
        }

        let init_key = format!("{}_INIT", prefix);
        if let Some(raw) = lookup(&init_key) {
            match AllocInit::parse(&raw) {
                Some(init) => config.init = init,
                None => warn!("ignoring {}={:?}: expected uninit, zero or a byte", init_key, raw),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = HeapConfig::from_lookup("device", lookup(&[]));
        assert_eq!(config, HeapConfig::default());
        assert_eq!(config.init, AllocInit::Uninitialized);
    }

    #[test]
    fn reads_limit_and_init() {
        let config = HeapConfig::from_lookup(
            "device",
            lookup(&[
                ("DEVALLOC_DEVICE_HEAP_LIMIT", "4096"),
                ("DEVALLOC_DEVICE_HEAP_INIT", "0xAB"),
            ]),
        );
        assert_eq!(config.limit, Some(4096));
        assert_eq!(config.init, AllocInit::Data(0xAB));
    }

    #[test]
    fn space_name_selects_variables() {
        let config = HeapConfig::from_lookup(
            "unified",
            lookup(&[
                ("DEVALLOC_DEVICE_HEAP_LIMIT", "1"),
                ("DEVALLOC_UNIFIED_HEAP_INIT", "zero"),
            ]),
        );
        assert_eq!(config.limit, None);
        assert_eq!(config.init, AllocInit::Zeroed);
    }

    #[test]
    fn malformed_values_are_ignored() {
        let config = HeapConfig::from_lookup(
            "device",
            lookup(&[
                ("DEVALLOC_DEVICE_HEAP_LIMIT", "lots"),
                ("DEVALLOC_DEVICE_HEAP_INIT", "0x1FF"),
            ]),
        );
        assert_eq!(config, HeapConfig::default());
    }

    #[test]
    fn builder_methods() {
        let config = HeapConfig::default()
            .with_limit(128)
            .with_init(AllocInit::Zeroed)
            .with_poison(0xDD);
        assert_eq!(config.limit, Some(128));
        assert_eq!(config.init.fill_byte(), Some(0));
        assert_eq!(config.poison_on_free, Some(0xDD));
    }
}
