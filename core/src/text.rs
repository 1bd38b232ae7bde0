use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[\W_]+").expect("valid regex");
    static ref PUNCT: Regex = Regex::new(r#"["!?,;:\[\]{}()<>]"#).expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Dictionary base form of a token. The English Snowball stemmer is the
/// lemmatizer service for the whole pipeline.
pub fn lemma(token: &str) -> String {
    STEMMER.stem(token).to_string()
}

/// Field cleaning applied once at corpus ingest: NFKC normalization,
/// case-folding, and runs of non-word characters collapsed to one space.
pub fn clean_field(text: &str) -> String {
    let folded = text.nfkc().collect::<String>().to_lowercase();
    NON_WORD.replace_all(&folded, " ").trim().to_string()
}

/// Lexicon tokenization: strip punctuation, case-fold, split on whitespace.
/// Free-standing dots do not survive as tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let stripped = PUNCT.replace_all(&lowered, "");
    stripped
        .split_whitespace()
        .filter(|t| !t.chars().all(|c| c == '.'))
        .map(str::to_string)
        .collect()
}

/// Forward-index tokenization: case-fold and split on whitespace, nothing
/// else. Dictionary membership decides which tokens count.
pub fn plain_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().map(str::to_lowercase)
}

/// Inverted-index reduction: keep only ASCII-alphabetic characters,
/// case-folded. `None` when nothing alphabetic remains (e.g. "2024").
pub fn alpha_token(word: &str) -> Option<String> {
    let cleaned: String = word
        .chars()
        .filter(char::is_ascii_alphabetic)
        .flat_map(char::to_lowercase)
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Query tokenization: whitespace split, case-fold, stop words dropped.
pub fn query_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(str::to_lowercase)
        .filter(|t| !is_stopword(t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_field_strips_punctuation_and_folds_case() {
        assert_eq!(clean_field("Deep-Learning, Explained!"), "deep learning explained");
        assert_eq!(clean_field("  ['ai', 'ml']  "), "ai ml");
    }

    #[test]
    fn tokenize_drops_lone_dots() {
        let toks = tokenize("rust . \"systems\" programming.");
        assert_eq!(toks, vec!["rust", "systems", "programming."]);
    }

    #[test]
    fn alpha_token_keeps_letters_only() {
        assert_eq!(alpha_token("ocean's"), Some("oceans".to_string()));
        assert_eq!(alpha_token("2024"), None);
        assert_eq!(alpha_token("Web3"), Some("web".to_string()));
    }

    #[test]
    fn query_tokens_filter_stopwords() {
        assert_eq!(query_tokens("the Ocean and a wave"), vec!["ocean", "wave"]);
        assert!(query_tokens("the a of").is_empty());
    }

    #[test]
    fn lemma_reduces_plurals() {
        assert_eq!(lemma("waves"), "wave");
    }
}
