//! Default capability implementations registered with the stage agents.
//!
//! The search, media, imagery, and moderation backends here are simulated
//! stand-ins at the external capability boundary; real deployments replace
//! them through the tool registry. The source-reliability and
//! metadata-consistency checks are real implementations.

pub mod media;
pub mod moderation;
pub mod search;
pub mod verification;

/// Capability names, shared between registration sites and call sites.
pub mod names {
    pub const WEB_SEARCH: &str = "web_search";
    pub const SOCIAL_MEDIA_SEARCH: &str = "social_media_search";
    pub const DOWNLOAD_MEDIA: &str = "download_media";
    pub const EXTRACT_METADATA: &str = "extract_metadata";
    pub const REVERSE_IMAGE_SEARCH: &str = "reverse_image_search";
    pub const GEOLOCATE_MEDIA: &str = "geolocate_media";
    pub const ANALYZE_SHADOWS: &str = "analyze_shadows";
    pub const CHECK_SOURCE_RELIABILITY: &str = "check_source_reliability";
    pub const CHECK_METADATA_CONSISTENCY: &str = "check_metadata_consistency";
    pub const CHECK_CONTENT_POLICY: &str = "check_content_policy";
    pub const ANONYMIZE_TEXT: &str = "anonymize_text";
}

/// Small deterministic hash used by the simulated backends to vary their
/// output per input, the way the reference backends key off file names.
pub(crate) fn pseudo_hash(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
