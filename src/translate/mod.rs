//! Language detection and translation.
//!
//! A remote [`TranslationProvider`] is optional. Without one, detection falls back to
//! counting common function words and translation returns the input unchanged. Provider
//! failures never surface as errors; they are logged and the original text is kept.

mod libre;

pub use libre::LibreTranslateProvider;

use crate::config::{AcquisitionSettings, TranslationSettings};
use crate::error::{KortError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Language assumed for very short or undetectable text.
pub const DEFAULT_LANGUAGE: &str = "en";
/// Target code meaning "detect and keep/normalize".
pub const AUTO: &str = "auto";
/// Texts shorter than this (trimmed, in chars) are assumed to be English.
pub const MIN_DETECT_CHARS: usize = 10;

/// Codes and display names of the languages the pipeline accepts.
pub const SUPPORTED_LANGUAGES: [(&str, &str); 13] = [
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    (AUTO, "Auto-detect"),
];

/// Function words per language, in tie-break order.
const FUNCTION_WORDS: [(&str, &[&str]); 6] = [
    ("en", &["the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by"]),
    ("es", &["el", "la", "los", "las", "y", "o", "pero", "en", "de", "con", "por", "para"]),
    ("fr", &["le", "la", "les", "et", "ou", "mais", "dans", "de", "avec", "par", "pour"]),
    ("de", &["der", "die", "das", "und", "oder", "aber", "in", "von", "mit", "für"]),
    ("it", &["il", "la", "i", "le", "e", "o", "ma", "in", "di", "con", "per"]),
    ("pt", &["o", "a", "os", "as", "e", "ou", "mas", "em", "de", "com", "por", "para"]),
];

/// Whether `code` is in [`SUPPORTED_LANGUAGES`].
pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|(c, _)| *c == code)
}

/// Reject language codes outside [`SUPPORTED_LANGUAGES`]. An empty code means `auto`.
pub fn check_language(code: &str) -> Result<()> {
    if code.is_empty() || is_supported(code) {
        return Ok(());
    }
    let codes: Vec<&str> = SUPPORTED_LANGUAGES.iter().map(|(c, _)| *c).collect();
    Err(KortError::Validation(format!(
        "Unsupported language code: {} (supported: {})",
        code,
        codes.join(", ")
    )))
}

/// Display name for a supported language code.
pub fn language_name(code: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Remote detection and translation service.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Detect the language of `text`, returning an ISO 639-1 code.
    async fn detect(&self, text: &str) -> Result<String>;

    /// Translate `text` between two language codes.
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String>;
}

/// Detect a language by counting function words. Ties go to the language listed first.
pub fn detect_by_function_words(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut best = (DEFAULT_LANGUAGE, 0usize);
    for (code, function_words) in FUNCTION_WORDS {
        let score = words
            .iter()
            .filter(|w| function_words.iter().any(|f| *f == **w))
            .count();
        debug!("Function word score {}: {}", code, score);
        if score > best.1 {
            best = (code, score);
        }
    }
    best.0
}

/// Detects languages and translates text, degrading to the input on any failure.
#[derive(Clone, Default)]
pub struct Translator {
    provider: Option<Arc<dyn TranslationProvider>>,
}

impl Translator {
    /// Build from settings. Remote translation is enabled only when a provider URL is set.
    pub fn new(settings: &TranslationSettings, acquisition: &AcquisitionSettings) -> Result<Self> {
        let provider = match settings.provider_url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => {
                let client = crate::acquisition::http::create_client(acquisition)?;
                let provider = LibreTranslateProvider::new(client, url)
                    .with_api_key(settings.api_key.clone());
                info!("Translation provider: {}", url);
                Some(Arc::new(provider) as Arc<dyn TranslationProvider>)
            }
            None => None,
        };
        Ok(Self { provider })
    }

    pub fn with_provider(provider: Arc<dyn TranslationProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Whether a remote provider is configured.
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Detect the language of `text`. Never fails.
    #[instrument(skip_all)]
    pub async fn detect_language(&self, text: &str) -> String {
        if text.trim().chars().count() < MIN_DETECT_CHARS {
            return DEFAULT_LANGUAGE.to_string();
        }

        if let Some(provider) = &self.provider {
            match provider.detect(text).await {
                Ok(code) if !code.is_empty() => {
                    debug!("{} detected {}", provider.name(), code);
                    return code;
                }
                Ok(_) => warn!("{} returned an empty language code", provider.name()),
                Err(e) => warn!("Language detection via {} failed: {}", provider.name(), e),
            }
        }

        detect_by_function_words(text).to_string()
    }

    /// Translate `text` from `from` to `to`. Returns the input when no translation is
    /// needed or possible.
    #[instrument(skip(self, text))]
    pub async fn translate(&self, text: &str, from: &str, to: &str) -> String {
        if text.trim().is_empty() || to.is_empty() || to == AUTO || from == to {
            return text.to_string();
        }

        let Some(provider) = &self.provider else {
            debug!("No translation provider, keeping {} text", from);
            return text.to_string();
        };

        match provider.translate(text, from, to).await {
            Ok(translated) => {
                info!("Translated {} -> {}", from, to);
                translated
            }
            Err(e) => {
                warn!("Translation {} -> {} failed, keeping original: {}", from, to, e);
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KortError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TranslationProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn detect(&self, _text: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(KortError::Provider("service unavailable".into()))
        }

        async fn translate(&self, _text: &str, _from: &str, _to: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(KortError::Provider("service unavailable".into()))
        }
    }

    struct UppercaseProvider;

    #[async_trait]
    impl TranslationProvider for UppercaseProvider {
        fn name(&self) -> &str {
            "uppercase"
        }

        async fn detect(&self, _text: &str) -> Result<String> {
            Ok("fr".to_string())
        }

        async fn translate(&self, text: &str, _from: &str, _to: &str) -> Result<String> {
            Ok(text.to_uppercase())
        }
    }

    #[test]
    fn test_function_word_detection() {
        assert_eq!(detect_by_function_words("The cat sat on the mat with a hat"), "en");
        assert_eq!(detect_by_function_words("Los perros y los gatos para el niño"), "es");
        assert_eq!(detect_by_function_words("Der Hund und die Katze mit dem Ball"), "de");
        assert_eq!(detect_by_function_words("Zzz qqq"), "en");
    }

    #[test]
    fn test_ties_go_to_first_declared() {
        // "la" and "de" score for both es and fr
        assert_eq!(detect_by_function_words("la casa de papel"), "es");
    }

    #[test]
    fn test_supported_languages() {
        assert!(is_supported("ja"));
        assert!(is_supported("auto"));
        assert!(!is_supported("xx"));
        assert_eq!(language_name("pt"), Some("Portuguese"));
    }

    #[test]
    fn test_check_language() {
        assert!(check_language("es").is_ok());
        assert!(check_language("auto").is_ok());
        assert!(check_language("").is_ok());

        let err = check_language("klingon").unwrap_err();
        assert!(matches!(err, KortError::Validation(_)));
        assert!(err.to_string().starts_with("Unsupported language code: klingon"));
    }

    #[tokio::test]
    async fn test_short_text_is_english() {
        let translator = Translator::with_provider(Arc::new(UppercaseProvider));
        assert_eq!(translator.detect_language("hola").await, "en");
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let provider = Arc::new(FailingProvider {
            calls: AtomicUsize::new(0),
        });
        let translator = Translator::with_provider(provider.clone());

        let detected = translator
            .detect_language("Los perros y los gatos son amigos para siempre")
            .await;
        assert_eq!(detected, "es");

        let out = translator.translate("Hello there", "en", "es").await;
        assert_eq!(out, "Hello there");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_translate_no_op_cases() {
        let translator = Translator::with_provider(Arc::new(UppercaseProvider));
        assert_eq!(translator.translate("same", "en", "en").await, "same");
        assert_eq!(translator.translate("auto", "en", "auto").await, "auto");
        assert_eq!(translator.translate("   ", "en", "es").await, "   ");
        assert_eq!(translator.translate("hello", "en", "es").await, "HELLO");
    }

    #[tokio::test]
    async fn test_no_provider_never_translates() {
        let translator = Translator::default();
        assert!(!translator.has_provider());
        assert_eq!(translator.translate("hello world", "en", "de").await, "hello world");
        assert_eq!(
            translator.detect_language("The quick brown fox jumps over the lazy dog").await,
            "en"
        );
    }
}
