//! Download filenames for generated looks.

/// Prefix shared by every downloaded file.
pub const FILENAME_PREFIX: &str = "hairstyle-ai-";

/// Lower-case `name` and join its words with `-`.
///
/// Leading and trailing whitespace is dropped and each interior run of
/// whitespace becomes a single `-`. Path separators are replaced too so
/// the result is always a single path component.
#[must_use]
pub fn style_slug(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            word.chars()
                .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// The suggested filename for the generated image of `style_name`.
///
/// ```
/// assert_eq!(
///     restyle_studio::download_filename("Soft Waves"),
///     "hairstyle-ai-soft-waves.png"
/// );
/// ```
#[must_use]
pub fn download_filename(style_name: &str) -> String {
    format!("{FILENAME_PREFIX}{}.png", style_slug(style_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_words() {
        assert_eq!(download_filename("Soft Waves"), "hairstyle-ai-soft-waves.png");
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(style_slug("  Long \t Layered\nShag "), "long-layered-shag");
    }

    #[test]
    fn punctuation_is_kept() {
        assert_eq!(style_slug("Curtain Bangs (Long)"), "curtain-bangs-(long)");
        assert_eq!(style_slug("Side-Swept Bob"), "side-swept-bob");
    }

    #[test]
    fn path_separators_are_replaced() {
        assert_eq!(style_slug("Bob/Lob"), "bob-lob");
        assert_eq!(style_slug("a\\b"), "a-b");
    }

    #[test]
    fn non_ascii_is_lowercased() {
        assert_eq!(style_slug("ÉTOILE Cut"), "étoile-cut");
    }
}
