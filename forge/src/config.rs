use crate::cancel::CancellationToken;

/// Parameters a driver builds to steer one compilation: there is no
/// on-disk config format to parse here, since argument/config parsing
/// belongs to an external driver CLI.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Polled between functions and blocks by the lowering and printing
    /// stages.
    pub cancel: CancellationToken,
    /// Use [`forge_lexer::lex_parallel`] when pre-lexing source with
    /// [`crate::lex_source`]. The TDL and IR parsers lex directly from source
    /// bytes internally and always do so single-threaded; this flag
    /// only affects callers that tokenize up front through
    /// [`crate::lex_source`] before handing tokens elsewhere (e.g. a
    /// driver's own diagnostics pass).
    pub chunked_lexing: bool,
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }
}
