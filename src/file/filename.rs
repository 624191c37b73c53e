//! Filename sanitizing for uploaded files.

use unicode_normalization::UnicodeNormalization;

/// Device names that cannot be used as filenames on Windows.
const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3",
];

/// Turn a client-supplied filename into one that is safe to store and echo back.
///
/// - The name is NFKD-normalized, then non-ASCII characters are dropped, so
///   accented letters keep their base letter (`é` becomes `e`).
/// - Path separators (`/` and `\`) become spaces, so directory parts fold
///   into the name instead of escaping the storage directory.
/// - Whitespace runs become a single `_`.
/// - Only `[A-Za-z0-9_.-]` survive.
/// - Leading and trailing `.` and `_` are stripped.
/// - Windows device names (`CON`, `NUL`, ...) get a `_` prefix.
///
/// The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '_' | '.' | '-'))
        .collect();

    let trimmed = filtered.trim_matches(|c: char| c == '.' || c == '_');

    let stem = trimmed.split('.').next().unwrap_or_default();
    if !trimmed.is_empty()
        && WINDOWS_DEVICE_NAMES
            .iter()
            .any(|name| name.eq_ignore_ascii_case(stem))
    {
        return format!("_{trimmed}");
    }

    trimmed.to_string()
}

/// Return the final extension of `filename`, including the leading dot.
///
/// Returns an empty string when there is no extension. Leading dots do not
/// start an extension, so `.bashrc` has none.
pub fn split_extension(filename: &str) -> &str {
    let name = filename.rsplit(&['/', '\\'][..]).next().unwrap_or(filename);
    let stem_start = name.len() - name.trim_start_matches('.').len();

    match name[stem_start..].rfind('.') {
        Some(idx) if idx > 0 => &name[stem_start + idx..],
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_filename_plain() {
        assert_eq!(secure_filename("report.pdf"), "report.pdf");
        assert_eq!(secure_filename("My-File_v2.tar.gz"), "My-File_v2.tar.gz");
    }

    #[test]
    fn test_secure_filename_whitespace() {
        assert_eq!(secure_filename("my  holiday   photo.jpg"), "my_holiday_photo.jpg");
        assert_eq!(secure_filename("\ttabbed\nname.txt"), "tabbed_name.txt");
    }

    #[test]
    fn test_secure_filename_path_traversal() {
        assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("/etc/shadow"), "etc_shadow");
        assert_eq!(secure_filename(r"C:\Users\me\notes.txt"), "C_Users_me_notes.txt");
    }

    #[test]
    fn test_secure_filename_special_characters() {
        assert_eq!(secure_filename("a\"b<c>d|e?.txt"), "abcde.txt");
        assert_eq!(secure_filename("semi;colon.txt"), "semicolon.txt");
    }

    #[test]
    fn test_secure_filename_strips_dots_and_underscores() {
        assert_eq!(secure_filename(".bashrc"), "bashrc");
        assert_eq!(secure_filename("__init__.py"), "init__.py");
        assert_eq!(secure_filename("trailing."), "trailing");
    }

    #[test]
    fn test_secure_filename_non_ascii() {
        assert_eq!(secure_filename("日本語.txt"), "txt");
        assert_eq!(secure_filename("résumé.doc"), "resume.doc");
        assert_eq!(secure_filename("café menu.pdf"), "cafe_menu.pdf");
        assert_eq!(secure_filename("日本語"), "");
    }

    #[test]
    fn test_secure_filename_accent_only_stem_keeps_extension() {
        assert_eq!(secure_filename("é.pdf"), "e.pdf");
        assert_eq!(split_extension(&secure_filename("é.pdf")), ".pdf");
        assert_eq!(secure_filename("Ｆｕｌｌｗｉｄｔｈ.txt"), "Fullwidth.txt");
    }

    #[test]
    fn test_secure_filename_windows_devices() {
        assert_eq!(secure_filename("con.txt"), "_con.txt");
        assert_eq!(secure_filename("NUL"), "_NUL");
        assert_eq!(secure_filename("console.txt"), "console.txt");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("photo.jpg"), ".jpg");
        assert_eq!(split_extension("archive.tar.gz"), ".gz");
        assert_eq!(split_extension("README"), "");
        assert_eq!(split_extension(".bashrc"), "");
        assert_eq!(split_extension("..hidden.txt"), ".txt");
        assert_eq!(split_extension("name."), ".");
        assert_eq!(split_extension("dir.d/file"), "");
        assert_eq!(split_extension(""), "");
    }
}
