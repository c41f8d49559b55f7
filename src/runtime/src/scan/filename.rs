//! Report file names derived from image names.

/// Name used when sanitizing leaves nothing.
pub const DEFAULT_REPORT_NAME: &str = "unknown_image";

/// Characters replaced by `_` in report file names.
const UNSAFE_CHARS: &[char] = &[
    '/', ':', ' ', '.', ',', '@', '&', '=', '?', '#', '%', '*', '"', '\'', '`', '<', '>', '|',
    '\\', '!',
];

/// Convert an image name to a safe file stem.
///
/// Unsafe characters become `_`, runs of `_` collapse to one, and leading or
/// trailing `_` are trimmed. Sanitizing an already sanitized name is a no-op.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if UNSAFE_CHARS.contains(&c) { '_' } else { c };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        DEFAULT_REPORT_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_registry_reference() {
        assert_eq!(
            sanitize_filename("docker.io/library/nginx:latest"),
            "docker_io_library_nginx_latest"
        );
    }

    #[test]
    fn test_sanitize_empty() {
        assert_eq!(sanitize_filename(""), "unknown_image");
    }

    #[test]
    fn test_sanitize_only_unsafe() {
        assert_eq!(sanitize_filename("/:.@!"), "unknown_image");
        assert_eq!(sanitize_filename("___"), "unknown_image");
    }

    #[test]
    fn test_sanitize_collapses_and_trims() {
        assert_eq!(
            sanitize_filename("  ghcr.io//org/app@sha256:abc  "),
            "ghcr_io_org_app_sha256_abc"
        );
        assert_eq!(sanitize_filename("a__b"), "a_b");
    }

    #[test]
    fn test_sanitize_every_unsafe_char() {
        let name = "a/b:c d.e,f@g&h=i?j#k%l*m\"n'o`p<q>r|s\\t!u";
        assert_eq!(
            sanitize_filename(name),
            "a_b_c_d_e_f_g_h_i_j_k_l_m_n_o_p_q_r_s_t_u"
        );
    }

    #[test]
    fn test_sanitize_keeps_safe_chars() {
        assert_eq!(sanitize_filename("my-app_v1+build"), "my-app_v1+build");
        assert_eq!(sanitize_filename("ünïcode"), "ünïcode");
    }

    #[test]
    fn test_sanitize_idempotent() {
        let inputs = [
            "",
            "_",
            "docker.io/library/nginx:latest",
            "registry.example.com:5000/team/app@sha256:0123abcd",
            "__lead and trail__",
            "0123456789abcdef",
            "weird!!name??with**stars",
            "unknown_image",
        ];
        for input in inputs {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once, "input: {input:?}");
        }
    }
}
