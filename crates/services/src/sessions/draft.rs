/// The answer text being composed for the current question.
///
/// Typed input and final voice transcripts both land here; interim transcripts
/// are kept aside as a preview and never submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerDraft {
    text: String,
    interim: Option<String>,
}

impl AnswerDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn interim(&self) -> Option<&str> {
        self.interim.as_deref()
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.interim = None;
    }

    /// Append a finalized transcript, separated from existing text by one space.
    pub fn append_final(&mut self, transcript: &str) {
        self.interim = None;
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return;
        }
        if !self.text.is_empty() && !self.text.ends_with(' ') {
            self.text.push(' ');
        }
        self.text.push_str(transcript);
    }

    pub fn set_interim(&mut self, partial: &str) {
        let partial = partial.trim();
        self.interim = (!partial.is_empty()).then(|| partial.to_owned());
    }

    /// Take the text for submission, leaving an empty draft behind.
    pub fn take(&mut self) -> String {
        self.interim = None;
        std::mem::take(&mut self.text)
    }

    /// Put back text whose submission did not go through, ahead of anything
    /// that arrived in the meantime.
    pub fn restore(&mut self, submitted: String) {
        if self.text.is_empty() {
            self.text = submitted;
            return;
        }
        let newer = std::mem::replace(&mut self.text, submitted);
        self.append_final(&newer);
    }
}
