//! Platform-aware legal path rewriting.
//!
//! Catalogs are written by people who name games things like
//! `Dwayne "The Rock" Jonson` and expect the tool to cope. This module
//! rewrites a path so the target platform will actually accept it,
//! without ever touching the separator characters themselves.

/// Characters no supported filesystem accepts in a path component.
const ILLEGAL: [char; 7] = ['"', '*', ':', '<', '>', '?', '|'];

/// Rewrite `path` so it is legal to write on a platform whose separator is
/// `separator`.
///
/// Illegal characters become underscores, with one carve-out: on
/// `\`-separated platforms a colon in leading drive-letter position
/// (`C:\...`) is kept, and every *other* colon becomes a semicolon (the
/// closest legal glyph, and what the surrounding ecosystem emits).
/// The separator itself always passes through untouched.
///
/// # Examples
///
/// ```
/// use romsift_storage::path::sanitize;
/// assert_eq!(
///     sanitize(r#"Dwayne "The Rock" Jonson.rom"#, '/'),
///     "Dwayne _The Rock_ Jonson.rom",
/// );
/// assert_eq!(sanitize(r"C:\ro:ms\fi:le.rom", '\\'), r"C:\ro;ms\fi;le.rom");
/// ```
pub fn sanitize(path: &str, separator: char) -> String {
    let windows = separator == '\\';
    let bytes = path.as_bytes();
    let has_drive_colon =
        windows && bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';

    path.chars()
        .enumerate()
        .map(|(at, c)| {
            if c == separator {
                c
            } else if c == ':' {
                match (windows, has_drive_colon && at == 1) {
                    (true, true) => ':',
                    (true, false) => ';',
                    (false, _) => '_',
                }
            } else if ILLEGAL.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}
