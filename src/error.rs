use thiserror::Error;

/// Aggregates every failure mode exposed by the unified chat client.
///
/// Callers match on the variant to distinguish a network fault from an
/// upstream rejection or a payload mismatch. Only [`LLMError::StreamDecode`]
/// is ever recovered internally (the offending line is dropped and the
/// stream continues); every other variant surfaces to the caller unchanged.
#[derive(Debug, Error)]
pub enum LLMError {
    /// Malformed input while assembling an outbound request. Not expected in
    /// normal operation; indicates a programming error on the caller side.
    #[error("request build failed: {message}")]
    Build { message: String },
    /// Transport-layer failure reaching the provider (timeout, connection
    /// reset, DNS).
    #[error("transport error: {message}")]
    Transport { message: String },
    /// Non-2xx response from the provider.
    #[error("upstream returned status {status}")]
    HttpStatus {
        /// HTTP status code reported by the provider.
        status: u16,
        /// Response body, kept verbatim for diagnostics.
        body: String,
    },
    /// Response payload does not match the shape the adapter expects.
    #[error("failed to parse provider payload: {message}")]
    Parse {
        message: String,
        /// Raw payload that failed to parse.
        raw: String,
    },
    /// One malformed line inside an SSE feed. Logged and skipped by the
    /// engine; never terminates the stream.
    #[error("undecodable stream line: {message}")]
    StreamDecode {
        message: String,
        /// Offending line, lossily decoded when it was not valid UTF-8.
        line: String,
    },
}

impl LLMError {
    /// Creates an [`LLMError::Build`] from a textual description.
    ///
    /// # Examples
    ///
    /// ```
    /// use hashi_llm::error::LLMError;
    ///
    /// let err = LLMError::build("empty message list");
    /// assert!(matches!(err, LLMError::Build { .. }));
    /// ```
    pub fn build<T: Into<String>>(message: T) -> Self {
        Self::Build {
            message: message.into(),
        }
    }

    /// Creates an [`LLMError::Transport`] from a textual description.
    ///
    /// Keeps call sites concise and transport failures uniformly worded
    /// across the crate.
    ///
    /// # Examples
    ///
    /// ```
    /// use hashi_llm::error::LLMError;
    ///
    /// let err = LLMError::transport("dns lookup failed");
    /// assert!(matches!(err, LLMError::Transport { .. }));
    /// ```
    pub fn transport<T: Into<String>>(message: T) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an [`LLMError::Parse`] carrying the raw payload for diagnosis.
    pub fn parse<T: Into<String>, R: Into<String>>(message: T, raw: R) -> Self {
        Self::Parse {
            message: message.into(),
            raw: raw.into(),
        }
    }
}
