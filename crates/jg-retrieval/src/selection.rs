//! Final service selection: retrieved classes plus mandatory ones.

use jg_catalog::Vocabulary;

use crate::retriever::ScoredClass;

/// Always offered, for its delay primitive.
pub const CLOCK: &str = "Clock";

/// Offered with a text-to-speech stub when retrieval did not pick it.
pub const SPEAKER: &str = "Speaker";

/// Methods block appended to the Speaker metadata in the stub document.
pub const SPEAK_STUB: &str =
    "\n\nMethods:\n  mediaPlayback_speak(text: STRING) -> VOID  # text-to-speech\n\n";

/// One device class offered to the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedService {
    pub key: String,
    pub doc: String,
    /// Relevance score, `None` for classes added by policy.
    pub score: Option<f32>,
}

/// Ordered, duplicate-free set of device classes with their documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    services: Vec<SelectedService>,
}

impl RetrievalResult {
    pub fn contains(&self, key: &str) -> bool {
        self.services.iter().any(|s| s.key == key)
    }

    fn push(&mut self, service: SelectedService) {
        if !self.contains(&service.key) {
            self.services.push(service);
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.services.iter().map(|s| s.key.clone()).collect()
    }

    pub fn services(&self) -> &[SelectedService] {
        &self.services
    }

    /// Documents joined the way the generator prompt expects.
    pub fn service_doc(&self) -> String {
        self.services
            .iter()
            .map(|s| s.doc.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n")
    }
}

/// Attach documents to the retrieved classes and apply the inclusion policy:
/// Clock is always present, and Speaker is added as a speech-only stub when
/// retrieval did not select it and the vocabulary defines it.
///
/// `vocabulary` should be the request's annotated copy so documents carry
/// the site's tags.
pub fn select_services(retrieved: &[ScoredClass], vocabulary: &Vocabulary) -> RetrievalResult {
    let mut result = RetrievalResult::default();

    for class in retrieved {
        let Some(device) = vocabulary.get(&class.key) else {
            tracing::warn!(class = %class.key, "retrieved class missing from vocabulary");
            continue;
        };
        result.push(SelectedService {
            key: class.key.clone(),
            doc: device.doc.clone(),
            score: Some(class.score),
        });
    }

    match vocabulary.get(CLOCK) {
        Some(clock) => result.push(SelectedService {
            key: CLOCK.to_string(),
            doc: clock.doc.clone(),
            score: None,
        }),
        None => tracing::warn!("vocabulary has no Clock class"),
    }

    if !result.contains(SPEAKER)
        && let Some(meta) = vocabulary.get(SPEAKER).and_then(|s| s.metadata_block())
    {
        result.push(SelectedService {
            key: SPEAKER.to_string(),
            doc: format!("{meta}{SPEAK_STUB}"),
            score: None,
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::SignalScores;
    use jg_catalog::parse_service_list;

    const VOCAB: &str = r#"Device Light:
    """
    Tags:
    #Light
    Methods:
      switch_on() -> VOID
    """
Device Clock:
    """
    Tags:
    #Clock
    Methods:
      clock_delay(hour: INTEGER, minute: INTEGER, second: INTEGER) -> VOID
    """
Device Speaker:
    """
    Tags:
    #Speaker
    Enums:
      playback: playing | paused
    Methods:
      mediaPlayback_play() -> VOID
      mediaPlayback_speak(text: STRING) -> VOID
    """
"#;

    fn scored(key: &str, score: f32) -> ScoredClass {
        ScoredClass {
            key: key.into(),
            score,
            signals: SignalScores::default(),
        }
    }

    #[test]
    fn clock_and_speaker_stub_added() {
        let vocab = parse_service_list(VOCAB).unwrap();
        let result = select_services(&[scored("Light", 0.8)], &vocab);
        assert_eq!(result.keys(), vec!["Light", "Clock", "Speaker"]);

        let speaker = &result.services()[2];
        assert!(speaker.doc.starts_with("Device Speaker:"));
        assert!(speaker.doc.ends_with(SPEAK_STUB));
        assert!(!speaker.doc.contains("mediaPlayback_play"));
        assert!(speaker.score.is_none());
    }

    #[test]
    fn selected_speaker_keeps_full_doc() {
        let vocab = parse_service_list(VOCAB).unwrap();
        let result = select_services(&[scored("Speaker", 0.9), scored("Clock", 0.1)], &vocab);
        assert_eq!(result.keys(), vec!["Speaker", "Clock"]);
        assert!(result.services()[0].doc.contains("mediaPlayback_play"));
    }

    #[test]
    fn no_stub_without_speaker_enums() {
        let text = VOCAB.replace("    Enums:\n      playback: playing | paused\n", "");
        let vocab = parse_service_list(&text).unwrap();
        let result = select_services(&[], &vocab);
        assert_eq!(result.keys(), vec!["Clock"]);
    }

    #[test]
    fn service_doc_joins_with_separator() {
        let vocab = parse_service_list(VOCAB).unwrap();
        let result = select_services(&[scored("Light", 0.8)], &vocab);
        let doc = result.service_doc();
        assert_eq!(doc.matches("\n---\n").count(), 2);
        assert!(doc.starts_with("Device Light:"));
    }

    #[test]
    fn unknown_retrieved_class_ignored() {
        let vocab = parse_service_list(VOCAB).unwrap();
        let result = select_services(&[scored("Ghost", 1.0)], &vocab);
        assert!(!result.contains("Ghost"));
        assert!(result.contains(CLOCK));
    }
}
