//! Human-readable names for image descriptors.

use super::index::ManifestDescriptor;

/// Annotation carrying the image reference name.
pub const REF_NAME_ANNOTATION: &str = "org.opencontainers.image.ref.name";

/// Annotation carrying the base image name.
pub const BASE_NAME_ANNOTATION: &str = "org.opencontainers.image.base.name";

/// Digests at or below this length are shown verbatim.
const SHORT_DIGEST_MIN_LEN: usize = 20;

/// Number of hash characters kept when shortening a digest.
const SHORT_DIGEST_CHARS: usize = 16;

/// Resolve a display name for a descriptor.
///
/// Precedence: `ref.name` annotation, `base.name` annotation, the first 16
/// characters after the digest's algorithm separator, then the raw digest.
/// The name is only used for logs and report file names.
pub fn resolve_name(descriptor: &ManifestDescriptor) -> String {
    if let Some(annotations) = descriptor.annotations() {
        for key in [REF_NAME_ANNOTATION, BASE_NAME_ANNOTATION] {
            if let Some(name) = annotations.get(key) {
                return name.clone();
            }
        }
    }

    let digest = descriptor.digest().as_str();
    short_digest(digest).unwrap_or(digest).to_string()
}

/// Shorten `algorithm:hex` to the leading hex characters.
///
/// Malformed digests (no separator, short or non-ASCII hash) are not shortened.
fn short_digest(digest: &str) -> Option<&str> {
    if digest.len() <= SHORT_DIGEST_MIN_LEN {
        return None;
    }
    let (_, hash) = digest.split_once(':')?;
    let hash = hash.split(':').next().unwrap_or(hash);
    hash.get(..SHORT_DIGEST_CHARS)
}
