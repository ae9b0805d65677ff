use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Every byte except ASCII alphanumerics, `_` and `-` is escaped, `%` included.
const FILE_KEY_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'-');

/// Builds `{prefix}{key}.{extension}` with `key` percent-encoded.
///
/// Distinct keys always give distinct file names, and none of them can leave the directory.
pub(crate) fn file_name(prefix: &str, key: &str, extension: &str) -> String {
    let encoded = utf8_percent_encode(key, FILE_KEY_ESCAPES);
    format!("{prefix}{encoded}.{extension}")
}
