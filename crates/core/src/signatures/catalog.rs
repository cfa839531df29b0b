use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::model::Architecture;
use crate::services::ResolveError;
use crate::signatures::{MaskedPattern, SignatureError};

/// Prologue idioms of BoringSSL's `ssl_verify_peer_cert` as emitted into
/// Flutter engine builds, most specific first.
const ARM64_PATTERNS: &[&str] = &[
    "F. 0F 1C F8 F. 5. 01 A9 F. 5. 02 A9 F. .. 03 A9 .. .. .. .. 68 1A 40 F9",
    "F. 43 01 D1 FE 67 01 A9 F8 5F 02 A9 F6 57 03 A9 F4 4F 04 A9 13 00 40 F9 F4 03 00 AA 68 1A 40 F9",
    "FF 43 01 D1 FE 67 01 A9 .. .. 06 94 .. 7. 06 94 68 1A 40 F9 15 15 41 F9 B5 00 00 B4 B6 4A 40 F9",
];

const ARM32_PATTERNS: &[&str] = &["2D E9 F. 4. D0 F8 00 80 81 46 D8 F8 18 00 D0 F8"];

const X86_64_PATTERNS: &[&str] = &[
    "55 41 57 41 56 41 55 41 54 53 50 49 89 fe 48 8b 1f 48 8b 43 30 4c 8b b8 d0 01 00 00 4d 85 ff 74 12 4d 8b a7 90 00 00 00 4d 85 e4 74 4a 49 8b 04 24 eb 46",
    "55 41 57 41 56 41 55 41 54 53 50 49 89 f. 4c 8b 37 49 8b 46 30 4c 8b a. .. 0. 00 00 4d 85 e. 74 1. 4d 8b",
    "55 41 57 41 56 41 55 41 54 53 48 83 EC 18 49 89 FF 48 8B 1F 48 8B 43 30 4C 8B A0 28 02 00 00 4D 85 E4 74",
    "55 41 57 41 56 41 55 41 54 53 48 83 EC 38 C6 02 50 48 8B AF A. 00 00 00 48 85 ED 74 7. 48 83 7D 00 00 74",
];

/// Architecture → ordered signature list. Earlier entries win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureCatalog {
    entries: BTreeMap<Architecture, Vec<MaskedPattern>>,
}

impl SignatureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The curated catalog shipped with the crate.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (arch, patterns) in [
            (Architecture::Arm64, ARM64_PATTERNS),
            (Architecture::Arm32, ARM32_PATTERNS),
            (Architecture::X86_64, X86_64_PATTERNS),
        ] {
            let parsed = patterns
                .iter()
                .filter_map(|text| match MaskedPattern::parse(text) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        log::error!("built-in {arch} signature rejected: {e}");
                        None
                    }
                })
                .collect();
            // Always nonempty for the shipped tables.
            let _ = catalog.insert(arch, parsed);
        }
        catalog
    }

    /// Replace the list for `arch`. Empty lists are refused.
    pub fn insert(
        &mut self,
        arch: Architecture,
        patterns: Vec<MaskedPattern>,
    ) -> Result<&mut Self, SignatureError> {
        if patterns.is_empty() {
            return Err(SignatureError::EmptyList(arch));
        }
        self.entries.insert(arch, patterns);
        Ok(self)
    }

    pub fn lookup(&self, arch: Architecture) -> Result<&[MaskedPattern], ResolveError> {
        self.entries
            .get(&arch)
            .map(Vec::as_slice)
            .ok_or(ResolveError::NoPatternsForArchitecture(arch))
    }

    pub fn architectures(&self) -> impl Iterator<Item = Architecture> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a catalog from a map of architecture tag → pattern strings.
    ///
    /// Tags accept the short names `arm` and `x86` as well as the canonical ones.
    pub fn from_map(map: BTreeMap<String, Vec<String>>) -> Result<Self, SignatureError> {
        let mut catalog = Self::new();
        for (tag, texts) in map {
            let arch: Architecture =
                tag.parse().map_err(|_| SignatureError::UnknownArchitecture(tag.clone()))?;
            let patterns = texts
                .iter()
                .map(|t| MaskedPattern::parse(t))
                .collect::<Result<Vec<_>, _>>()?;
            catalog.insert(arch, patterns)?;
        }
        Ok(catalog)
    }

    /// Load a catalog file; `.json` is parsed as JSON, anything else as YAML.
    pub fn from_path(path: &Path) -> Result<Self, SignatureError> {
        let body = fs::read_to_string(path)
            .map_err(|source| SignatureError::Io { path: path.to_path_buf(), source })?;
        let parse_err =
            |message: String| SignatureError::Parse { path: path.to_path_buf(), message };
        let map: BTreeMap<String, Vec<String>> =
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                serde_json::from_str(&body).map_err(|e| parse_err(e.to_string()))?
            } else {
                serde_yaml::from_str(&body).map_err(|e| parse_err(e.to_string()))?
            };
        Self::from_map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_architecture_in_order() {
        let catalog = SignatureCatalog::builtin();
        for arch in Architecture::ALL {
            assert!(!catalog.lookup(arch).unwrap().is_empty(), "{arch}");
        }
        assert_eq!(catalog.lookup(Architecture::Arm64).unwrap().len(), 3);
        assert_eq!(catalog.lookup(Architecture::Arm32).unwrap().len(), 1);
        assert_eq!(catalog.lookup(Architecture::X86_64).unwrap().len(), 4);
        assert_eq!(
            catalog.lookup(Architecture::Arm64).unwrap()[0].to_string(),
            ARM64_PATTERNS[0]
        );
    }

    #[test]
    fn missing_architecture_is_reported() {
        let catalog = SignatureCatalog::new();
        let err = catalog.lookup(Architecture::Arm32).unwrap_err();
        assert!(matches!(err, ResolveError::NoPatternsForArchitecture(Architecture::Arm32)));
    }

    #[test]
    fn insert_refuses_empty_lists() {
        let mut catalog = SignatureCatalog::new();
        assert!(matches!(
            catalog.insert(Architecture::X86_64, vec![]),
            Err(SignatureError::EmptyList(Architecture::X86_64))
        ));
        assert!(catalog.is_empty());
    }
}
