use std::fmt::Write as _;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Bytes left alone when encoding a path, beyond the unreserved set
pub(crate) const PATH_SAFE: &[u8] = b"/";
/// Bytes left alone when encoding a query string, beyond the unreserved set
pub(crate) const QUERY_SAFE: &[u8] = b"/?=&;+%:@,!$'()*";

/// Split an origin-form request target into its path and query
///
/// The fragment, if a client sent one, is dropped.  Returns `None` for anything that
/// isn't origin-form (`*`, absolute URLs).
pub(crate) fn split_target(target: &str) -> Option<(&str, Option<&str>)> {
    let target = target.split_once('#').map_or(target, |(target, _)| target);
    if !target.starts_with('/') {
        return None;
    }
    match target.split_once('?') {
        Some((path, query)) => Some((path, Some(query))),
        None => Some((target, None)),
    }
}

pub(crate) fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(byte) = bytes.get(i + 1..i + 3).and_then(decode_hex_pair) {
                decoded.push(byte);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

fn decode_hex_pair(pair: &[u8]) -> Option<u8> {
    if !pair.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let pair = std::str::from_utf8(pair).ok()?;
    u8::from_str_radix(pair, 16).ok()
}

/// Percent-encode everything outside of the unreserved set and `safe`
pub(crate) fn percent_encode(input: &str, safe: &[u8]) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) || safe.contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

/// The plain names in a decoded URL path
///
/// Empty, `.`, `..`, segments with a backslash or NUL, and anything the platform would
/// read as more than one component (separators, drive prefixes) are dropped.
pub(crate) fn segments(decoded: &str) -> Vec<&str> {
    decoded
        .split('/')
        .filter(|segment| {
            if segment.is_empty() {
                return false;
            }
            let mut components = Path::new(segment).components();
            let plain = matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            ) && !segment.contains(['\\', '\0']);
            if !plain {
                log::trace!("Dropping path segment {segment:?}");
            }
            plain
        })
        .collect()
}

/// The URL path for `decoded` once [`segments`] has cleaned it up, with a single leading `/`
pub(crate) fn normalize(decoded: &str) -> String {
    let mut normalized = String::from("/");
    normalized.push_str(&segments(decoded).join("/"));
    normalized
}

/// Map a decoded URL path onto `root`
pub(crate) fn resolve(root: &Path, decoded: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(segments(decoded));
    path
}

/// Canonicalize `candidate`, refusing anything that lands outside of `root`
///
/// `root` must already be canonical.  Missing paths are `None` as well.
pub(crate) fn contain(root: &Path, candidate: &Path) -> Option<PathBuf> {
    let resolved = dunce::canonicalize(candidate).ok()?;
    if resolved.starts_with(root) {
        Some(resolved)
    } else {
        log::warn!(
            "Refusing `{}`: resolves outside of `{}`",
            candidate.display(),
            root.display()
        );
        None
    }
}
