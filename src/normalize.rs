// Organization name cleanup.
//
// Exports spell out the full legal form of each institution
// ("ГОСУДАРСТВЕННОЕ БЮДЖЕТНОЕ УЧРЕЖДЕНИЕ ЗДРАВООХРАНЕНИЯ ..."), which makes
// filter lists and chart legends unreadable. The catalog is applied in order
// and each phrase is stripped on its own.

#[derive(Debug, Clone)]
pub struct OrgNormalizer {
    phrases: Vec<String>,
}

impl OrgNormalizer {
    pub fn new(phrases: &[String]) -> Self {
        let phrases = phrases
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    /// Strip every catalog phrase, trimming after each removal.
    ///
    /// The pass repeats until the value stops changing, so feeding an
    /// already normalized name back in returns it unchanged.
    pub fn normalize(&self, raw: &str) -> String {
        let mut current = raw.trim().to_string();
        loop {
            let mut next = current.clone();
            for phrase in &self.phrases {
                if next.contains(phrase.as_str()) {
                    next = next.replace(phrase.as_str(), "").trim().to_string();
                }
            }
            if next == current {
                return current;
            }
            current = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizeConfig;

    fn default_normalizer() -> OrgNormalizer {
        OrgNormalizer::new(&NormalizeConfig::default().remove_phrases)
    }

    #[test]
    fn test_strips_regional_prefix() {
        let n = default_normalizer();
        let raw = "ГОСУДАРСТВЕННОЕ БЮДЖЕТНОЕ УЧРЕЖДЕНИЕ ЗДРАВООХРАНЕНИЯ ЛЕНИНГРАДСКОЙ ОБЛАСТИ ПОЛИКЛИНИКА №1";
        assert_eq!(n.normalize(raw), "ПОЛИКЛИНИКА №1");
    }

    #[test]
    fn test_strips_every_matching_phrase() {
        let n = OrgNormalizer::new(&["ALPHA".to_string(), "BETA".to_string()]);
        assert_eq!(n.normalize("  ALPHA clinic BETA "), "clinic");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let n = default_normalizer();
        let samples = [
            "ОБЩЕСТВО С ОГРАНИЧЕННОЙ ОТВЕТСТВЕННОСТЬЮ \"МЕДИКА\"",
            "ГОСУДАРСТВЕННОЕ КАЗЕННОЕ УЧРЕЖДЕНИЕ ЗДРАВООХРАНЕНИЯ ЛЕНИНГРАДСКОЙ ОБЛАСТИ СТАНЦИЯ",
            "Районная больница",
            "",
        ];
        for raw in samples {
            let once = n.normalize(raw);
            assert_eq!(n.normalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_nested_phrase_is_removed_on_repeat_pass() {
        let n = OrgNormalizer::new(&["AB".to_string()]);
        // Removing the inner "AB" exposes a new one.
        assert_eq!(n.normalize("AABB x"), "x");
    }

    #[test]
    fn test_untouched_name_is_only_trimmed() {
        let n = default_normalizer();
        assert_eq!(n.normalize("  ЦРБ г. Тосно "), "ЦРБ г. Тосно");
    }
}
