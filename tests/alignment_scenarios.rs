//! End-to-end alignment scenarios.
//!
//! Every test tokenizes with the whitespace reference tokenizer, so token
//! boundaries are easy to read off the sentence.

use absa::{
    align, align_raw, AspectSpan, LabelAligner, LabelVocabulary, LabeledSentence,
    OffsetTokenizer, Polarity, SubwordPolicy, TokenOffset, TokenizedSentence,
    WhitespaceTokenizer, IGNORE_INDEX,
};

const BATTERY_SCREEN: &str = "The battery is great but the screen is bad.";

fn tags(sentence: &str, aspects: &[AspectSpan], tokenizer: &WhitespaceTokenizer) -> Vec<String> {
    let vocab = LabelVocabulary::standard();
    let tokens = tokenizer.encode(sentence).unwrap();
    let labels = align(sentence, aspects, &tokens, &vocab, SubwordPolicy::FirstSubword).unwrap();
    labels
        .tags(&vocab)
        .into_iter()
        .map(|t| t.unwrap_or("-100").to_string())
        .collect()
}

#[test]
fn battery_positive_screen_negative() {
    // "screen" starts at char 29
    let aspects = vec![
        AspectSpan::new("battery", Polarity::Positive, 4, 11),
        AspectSpan::new("screen", Polarity::Negative, 29, 35),
    ];
    let got = tags(BATTERY_SCREEN, &aspects, &WhitespaceTokenizer::new());
    assert_eq!(
        got,
        vec![
            "-100", "O", "B-ASP-POS", "O", "O", "O", "O", "B-ASP-NEG", "O", "O", "O", "-100"
        ]
    );
}

#[test]
fn training_ids_for_battery_screen() {
    let sentence = LabeledSentence::new(
        BATTERY_SCREEN,
        vec![
            AspectSpan::new("battery", Polarity::Positive, 4, 11),
            AspectSpan::new("screen", Polarity::Negative, 29, 35),
        ],
        "laptop",
    );
    let aligned = LabelAligner::default()
        .align_with(&WhitespaceTokenizer::new(), &sentence)
        .unwrap();
    assert_eq!(
        aligned.labels.to_training_ids(),
        vec![-100, 0, 1, 0, 0, 0, 0, 2, 0, 0, 0, -100]
    );
}

#[test]
fn empty_aspect_list_labels_everything_outside() {
    let got = tags(BATTERY_SCREEN, &[], &WhitespaceTokenizer::new());
    assert_eq!(got.first().map(String::as_str), Some("-100"));
    assert_eq!(got.last().map(String::as_str), Some("-100"));
    assert!(got[1..got.len() - 1].iter().all(|t| t == "O"));
}

#[test]
fn overlapping_aspects_first_listed_wins() {
    let sentence = "The battery life is great";
    let aspects = vec![
        AspectSpan::new("battery life", Polarity::Positive, 4, 16),
        AspectSpan::new("battery", Polarity::Negative, 4, 11),
    ];
    let got = tags(sentence, &aspects, &WhitespaceTokenizer::new());
    assert_eq!(
        got,
        vec!["-100", "O", "B-ASP-POS", "I-ASP-POS", "O", "O", "-100"]
    );

    let same_range = vec![
        AspectSpan::new("battery", Polarity::Neutral, 4, 11),
        AspectSpan::new("battery", Polarity::Positive, 4, 11),
    ];
    let got = tags(sentence, &same_range, &WhitespaceTokenizer::new());
    assert_eq!(got[2], "B-ASP-NEU");
}

#[test]
fn span_cutting_through_tokens_still_labels_by_overlap() {
    // [31, 37) starts inside "screen" (29..35) and ends inside "is" (36..38)
    let aspects = vec![AspectSpan::new("screen", Polarity::Negative, 31, 37)];
    let got = tags(BATTERY_SCREEN, &aspects, &WhitespaceTokenizer::new());
    assert_eq!(got[7], "I-ASP-NEG");
    assert_eq!(got[8], "B-ASP-NEG");
    assert_eq!(got[6], "O");
    assert_eq!(got[9], "O");
}

#[test]
fn unknown_polarity_is_skipped() {
    let aspects = vec![
        AspectSpan::with_raw_polarity("battery", "mixed", 4, 11),
        AspectSpan::new("screen", Polarity::Negative, 29, 35),
    ];
    let got = tags(BATTERY_SCREEN, &aspects, &WhitespaceTokenizer::new());
    assert_eq!(got[2], "O");
    assert_eq!(got[7], "B-ASP-NEG");
}

#[test]
fn empty_span_is_skipped() {
    let aspects = vec![AspectSpan::new("battery", Polarity::Positive, 11, 4)];
    let got = tags(BATTERY_SCREEN, &aspects, &WhitespaceTokenizer::new());
    assert!(got[1..got.len() - 1].iter().all(|t| t == "O"));
}

#[test]
fn multi_subword_aspect_first_subword_policy() {
    let tokenizer = WhitespaceTokenizer::new().with_max_subword_chars(3);
    let tokens = tokenizer.encode("The battery died").unwrap();
    assert_eq!(
        tokens.tokens,
        vec!["[CLS]", "The", "bat", "##ter", "##y", "die", "##d", "[SEP]"]
    );

    let vocab = LabelVocabulary::standard();
    let aspects = vec![AspectSpan::new("battery", Polarity::Negative, 4, 11)];

    let first = align(
        "The battery died",
        &aspects,
        &tokens,
        &vocab,
        SubwordPolicy::FirstSubword,
    )
    .unwrap();
    assert_eq!(first.to_training_ids(), vec![-100, 0, 2, -100, -100, 0, -100, -100]);

    let all = align(
        "The battery died",
        &aspects,
        &tokens,
        &vocab,
        SubwordPolicy::AllSubwords,
    )
    .unwrap();
    assert_eq!(all.to_training_ids(), vec![-100, 0, 2, 5, 5, 0, 0, -100]);
}

#[test]
fn genuine_zero_length_token_elsewhere_is_content() {
    // only (0,0) is the special marker; (3,3) is an ordinary empty token
    let tokens = TokenizedSentence::new(
        vec![
            TokenOffset::SPECIAL,
            TokenOffset::new(0, 3),
            TokenOffset::new(3, 3),
            TokenOffset::SPECIAL,
        ],
        vec![None, Some(0), Some(1), None],
    )
    .unwrap();
    let raw = align_raw(&[], &tokens, &LabelVocabulary::standard()).unwrap();
    assert_eq!(raw.to_training_ids(), vec![IGNORE_INDEX, 0, 0, IGNORE_INDEX]);
}

#[test]
fn non_ascii_sentence_uses_char_offsets() {
    let sentence = "Café crème was fantastic";
    // "crème" is chars 5..10
    let aspects = vec![AspectSpan::new("crème", Polarity::Positive, 5, 10)];
    let got = tags(sentence, &aspects, &WhitespaceTokenizer::new());
    assert_eq!(got, vec!["-100", "O", "B-ASP-POS", "O", "O", "-100"]);
}

#[test]
fn mismatched_tokenizer_output_is_an_error() {
    let tokens = TokenizedSentence {
        offsets: vec![TokenOffset::new(0, 3)],
        word_ids: vec![],
        tokens: vec![],
    };
    assert!(align_raw(&[], &tokens, &LabelVocabulary::standard()).is_err());
}

#[test]
fn batch_alignment_preserves_order() {
    let sentences: Vec<LabeledSentence> = (0..20)
        .map(|i| {
            LabeledSentence::new(
                format!("item {i} has a good screen"),
                vec![],
                "laptop",
            )
            .with_id(format!("laptop_{i}"))
        })
        .collect();
    let aligned = LabelAligner::default()
        .align_batch(&WhitespaceTokenizer::new(), &sentences)
        .unwrap();
    let ids: Vec<_> = aligned.iter().map(|a| a.id.clone().unwrap()).collect();
    let expected: Vec<_> = (0..20).map(|i| format!("laptop_{i}")).collect();
    assert_eq!(ids, expected);
}
