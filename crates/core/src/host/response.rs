//! Adapters from raw host output to typed values.
//!
//! Nothing here touches a session; every function takes the text a command
//! printed and either extracts what the pipeline needs or reports the
//! response as malformed.

use serde::Deserialize;

use crate::host::{HostError, MetadataQuery};
use crate::model::{BinaryMetadata, FunctionId};

#[derive(Debug, Deserialize)]
struct BinsListing {
    #[serde(default)]
    bins: Option<Vec<HostBinInfo>>,
}

#[derive(Debug, Deserialize)]
struct InfoListing {
    #[serde(default)]
    bin: Option<HostBinInfo>,
}

#[derive(Debug, Deserialize)]
struct HostBinInfo {
    #[serde(default)]
    arch: Option<String>,
    #[serde(default)]
    bits: Option<u32>,
}

/// Parse the JSON answer to a metadata query.
pub fn parse_metadata(query: MetadataQuery, body: &str) -> Result<BinaryMetadata, HostError> {
    let malformed = |message: String| HostError::Malformed {
        command: query.command().to_string(),
        message,
    };
    let body = body.trim();
    if body.is_empty() {
        return Err(malformed("empty response".into()));
    }

    let info = match query {
        MetadataQuery::Archives | MetadataQuery::ArchList => {
            let listing: BinsListing =
                serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
            listing.bins.and_then(|bins| bins.into_iter().next())
        }
        MetadataQuery::Info => {
            let listing: InfoListing =
                serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
            listing.bin
        }
    }
    .ok_or_else(|| malformed("no binary entry".into()))?;

    match (info.arch, info.bits) {
        (Some(arch), Some(bits)) if !arch.is_empty() => Ok(BinaryMetadata::new(arch, bits)),
        _ => Err(malformed("missing arch or bits".into())),
    }
}

/// Extract hit addresses from search output, keeping response order.
///
/// Each nonblank line contributes its first token if that token is `0x`-prefixed
/// hex. Other lines (`Searching 4 bytes in ...`, warnings) are skipped.
pub fn parse_search_hits(body: &str) -> Vec<u64> {
    body.lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter_map(parse_hex_token)
        .collect()
}

/// First token of the first nonblank line, if any.
pub fn parse_function_listing(body: &str) -> Option<FunctionId> {
    body.lines()
        .find_map(|line| line.split_whitespace().next())
        .map(FunctionId::from_token)
}

fn parse_hex_token(token: &str) -> Option<u64> {
    let digits = token.strip_prefix("0x")?;
    u64::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_from_bins_listing() {
        let body = r#"{"bins":[{"arch":"arm","bits":64,"offset":0,"machine":"ARM aarch64"}]}"#;
        let meta = parse_metadata(MetadataQuery::Archives, body).unwrap();
        assert_eq!(meta, BinaryMetadata::new("arm", 64));
    }

    #[test]
    fn metadata_from_info_listing() {
        let body = r#"{"core":{"file":"libflutter.so"},"bin":{"arch":"x86","bits":64}}"#;
        let meta = parse_metadata(MetadataQuery::Info, body).unwrap();
        assert_eq!(meta, BinaryMetadata::new("x86", 64));
    }

    #[test]
    fn metadata_rejects_empty_and_garbage() {
        assert!(parse_metadata(MetadataQuery::Archives, "").is_err());
        assert!(parse_metadata(MetadataQuery::Archives, "Invalid command 'iaj'").is_err());
        assert!(parse_metadata(MetadataQuery::ArchList, r#"{"bins":[]}"#).is_err());
        assert!(parse_metadata(MetadataQuery::Info, r#"{"bin":{"arch":"arm"}}"#).is_err());
    }

    #[test]
    fn search_hits_skip_blank_and_non_address_lines() {
        let body = "\n0x1000 extra text\n\n";
        assert_eq!(parse_search_hits(body), vec![0x1000]);
    }

    #[test]
    fn search_hits_keep_order_and_ignore_noise() {
        let body = "Searching 8 bytes in [0x0-0x1000]\nhits: 2\n0x00004000 hit0_0 f00f1cf8\n  0x2000 hit0_1\n0xZZ bad\n";
        assert_eq!(parse_search_hits(body), vec![0x4000, 0x2000]);
    }

    #[test]
    fn function_listing_takes_first_token() {
        let body = "\n0x00004000    3     20 fcn.00004000\n";
        assert_eq!(parse_function_listing(body), Some(FunctionId::Address(0x4000)));
        assert_eq!(
            parse_function_listing("fcn.00004000\n"),
            Some(FunctionId::Symbol("fcn.00004000".into()))
        );
        assert_eq!(parse_function_listing("  \n\n"), None);
    }
}
