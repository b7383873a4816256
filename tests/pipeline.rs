//! Annotation rows through training records, and predictions through a
//! pros/cons summary.

use absa::dataset::{
    group_annotations, prepare_sentences, read_jsonl_from, split_dataset, write_jsonl_to,
    AnnotationRow,
};
use absa::summary::{
    build_summary_prompt, parse_summary_response, summarize_reviews, FinalSummary, ProsCons,
    SentimentTally, Summarizer,
};
use absa::{
    AbsaConfig, LabelAligner, LabelVocabulary, OffsetTokenizer, Reassembler, Result,
    ReviewAspects, TrainingRecord, WhitespaceTokenizer,
};

const ROWS: &str = r#"
{"id": 1, "domain": "laptop", "sentence": "The battery is great but the screen is bad.", "aspect_term": "battery", "polarity": "positive", "from": 4, "to": 11}
{"id": 1, "domain": "laptop", "sentence": "The battery is great but the screen is bad.", "aspect_term": "screen", "polarity": "negative", "from": 29, "to": 35}
{"id": 2, "domain": "laptop", "sentence": "Keyboard is okay.", "aspect_term": "Keyboard", "polarity": "conflict", "from": 0, "to": 8}
{"id": 1, "domain": "restaurant", "sentence": "The soup was cold.", "aspect_term": "soup", "polarity": "negative", "from": 4, "to": 8}
{"id": 3, "domain": "restaurant", "sentence": "Nice place", "aspect_term": "place", "polarity": "mixed", "from": 5, "to": 10}
"#;

#[test]
fn rows_to_training_records() {
    let rows: Vec<AnnotationRow> = read_jsonl_from(ROWS.as_bytes()).unwrap();
    let prepared = prepare_sentences(&rows);
    assert_eq!(prepared.stats.unexpected_polarity, 1);
    assert_eq!(prepared.stats.conflict_mapped, 1);

    let ids: Vec<&str> = prepared
        .sentences
        .iter()
        .filter_map(|s| s.id.as_deref())
        .collect();
    assert_eq!(ids, vec!["laptop_1", "laptop_2", "restaurant_1"]);

    let aligned = LabelAligner::default()
        .align_batch(&WhitespaceTokenizer::new(), &prepared.sentences)
        .unwrap();
    let records: Vec<TrainingRecord> = aligned.iter().map(|a| a.to_training_record()).collect();
    assert_eq!(records[0].labels, vec![-100, 0, 1, 0, 0, 0, 0, 2, 0, 0, 0, -100]);
    // conflict → neutral
    assert_eq!(records[1].labels, vec![-100, 3, 0, 0, 0, -100]);

    let mut out = Vec::new();
    write_jsonl_to(&mut out, &records).unwrap();
    let back: Vec<TrainingRecord> = read_jsonl_from(out.as_slice()).unwrap();
    assert_eq!(back, records);
}

#[test]
fn config_drives_split_and_alignment() {
    let config = AbsaConfig::from_toml_str(
        r#"
        label_all_subword_tokens = true
        seed = 7
        validation_fraction = 0.2
        test_fraction = 0.2
        "#,
    )
    .unwrap();
    config.validate().unwrap();

    let rows: Vec<AnnotationRow> = read_jsonl_from(ROWS.as_bytes()).unwrap();
    let sentences = group_annotations(&rows);
    let splits = split_dataset(
        sentences.clone(),
        config.validation_fraction,
        config.test_fraction,
        config.seed,
    )
    .unwrap();
    assert_eq!(splits.len(), sentences.len());
    assert_eq!(splits.train.len(), 1);

    let aligner = LabelAligner::from_config(&config).unwrap();
    let tokenizer = WhitespaceTokenizer::new().with_max_subword_chars(4);
    let aligned = aligner.align_with(&tokenizer, &sentences[0]).unwrap();
    // every content token is supervised when all subwords are labeled
    assert_eq!(
        aligned.labels.supervised_count(),
        aligned.tokens.offsets.iter().filter(|o| !o.is_special()).count()
    );
}

struct EchoTopTerm;

impl Summarizer for EchoTopTerm {
    fn generate(&self, prompt: &str) -> Result<String> {
        let first = prompt
            .lines()
            .find(|l| l.starts_with("- Aspect:"))
            .unwrap_or_default()
            .to_string();
        Ok(format!(
            "```json\n{}\n```",
            serde_json::json!({"pros": [first], "cons": [], "summary_paragraph": "ok"})
        ))
    }
}

fn predicted_reviews() -> Vec<ReviewAspects> {
    let vocab = LabelVocabulary::standard();
    let tokenizer = WhitespaceTokenizer::new();
    let reassembler = Reassembler::new(vocab.clone());
    let reviews = [
        ("great battery and bad fan", [0, 0, 1, 0, 0, 2, 0]),
        ("battery lasts , fan loud", [0, 1, 0, 0, 2, 0, 0]),
    ];
    reviews
        .iter()
        .map(|(text, ids)| {
            let tokens = tokenizer.encode(text).unwrap();
            let rows: Vec<Vec<f32>> = ids
                .iter()
                .map(|&id| {
                    (0..vocab.len())
                        .map(|j| if j == id { 0.9 } else { 0.0 })
                        .collect()
                })
                .collect();
            reassembler.review(text, &tokens, &rows).unwrap()
        })
        .collect()
}

#[test]
fn predictions_to_summary() {
    let reviews = predicted_reviews();
    let tally = SentimentTally::from_reviews(&reviews);
    assert_eq!(tally.get("battery").unwrap().positive, 2);
    assert_eq!(tally.get("fan").unwrap().negative, 2);

    let pros_cons = ProsCons::from_tally(&tally, 5, 5);
    assert_eq!(pros_cons.pros[0].term, "battery");
    assert_eq!(pros_cons.cons[0].term, "fan");

    let prompt = build_summary_prompt(&tally, 5, 5);
    assert!(prompt.contains("- Aspect: 'battery', Positive mentions: 2"));

    let summary = summarize_reviews(&reviews, Some(&EchoTopTerm), 5, 5);
    assert_eq!(summary.summary_paragraph, "ok");
    assert!(summary.pros[0].contains("'battery'"));

    assert_eq!(
        summarize_reviews(&reviews, None, 5, 5),
        FinalSummary::unavailable()
    );
    assert!(parse_summary_response("{}").is_err());
}
