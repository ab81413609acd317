/// Canonical form used for comparing a guess with a translation.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Exact equality after normalization is the only correctness rule.
pub fn is_correct(guess: &str, translation: &str) -> bool {
    normalize(guess) == normalize(translation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_folds_case() {
        assert_eq!(normalize("Casa "), normalize("casa"));
        assert_eq!(normalize("\tGATO\n"), "gato");
    }

    #[test]
    fn grading_is_exact_after_normalization() {
        assert!(is_correct(" Gato", "gato"));
        assert!(!is_correct("perro", "gato"));
        assert!(!is_correct("gatos", "gato"));
        assert!(!is_correct("g ato", "gato"));
    }

    #[test]
    fn folds_non_ascii_case() {
        assert!(is_correct("ÉCOLE", "école"));
    }
}
