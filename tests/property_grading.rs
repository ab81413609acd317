use proptest::prelude::*;

use vocab_quiz::quiz::grading::{is_correct, normalize};
use vocab_quiz::store::keys::word_natural_key;

proptest! {
    #[test]
    fn pt_padding_and_case_never_change_the_verdict(
        word in "[a-zA-Z]{1,12}",
        left in " {0,4}",
        right in " {0,4}",
    ) {
        let guess = format!("{left}{}{right}", word.to_uppercase());
        prop_assert!(is_correct(&guess, &word));
        prop_assert!(is_correct(&word, &guess));
    }

    #[test]
    fn pt_normalize_is_idempotent(text in "[a-zA-Z\u{c0}-\u{ff} ]{0,24}") {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn pt_different_letters_are_wrong(a in "[a-z]{1,10}", b in "[a-z]{1,10}") {
        prop_assume!(a != b);
        prop_assert!(!is_correct(&a, &b));
    }

    #[test]
    fn pt_natural_keys_do_not_collide(
        text_a in "[a-z:]{1,8}", stem_a in "[a-z:]{0,8}",
        text_b in "[a-z:]{1,8}", stem_b in "[a-z:]{0,8}",
    ) {
        prop_assume!((text_a.as_str(), stem_a.as_str()) != (text_b.as_str(), stem_b.as_str()));
        prop_assert_ne!(
            word_natural_key(3, &text_a, &stem_a),
            word_natural_key(3, &text_b, &stem_b)
        );
    }
}
