//! A standalone tokenization entry point for drivers that want tokens
//! on their own (diagnostics, syntax highlighting) rather than going
//! through a parser. The TDL and IR parsers always lex source
//! single-threaded internally; this is the only place
//! [`forge_lexer::lex_parallel`] is reachable from the facade.

pub use forge_lexer::{KeywordMap, LexError, LexResult, LexerConfig, Token};

/// Tokenize `source` under `keywords`, either single-threaded or with
/// [`forge_lexer::lex_parallel`]'s two-way chunked strategy.
pub fn lex_source(source: &[u8], keywords: KeywordMap, chunked: bool) -> LexResult<Vec<Token>> {
    let config = LexerConfig::new(keywords);
    if chunked {
        forge_lexer::lex_parallel(source, &config)
    } else {
        forge_lexer::lex(source, &config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_threaded_and_chunked_agree_on_a_small_tdl_snippet() {
        let src = b"regclass [ GPR32 ]\nregister EAX { width = 32 class = GPR32 }\n";
        let sequential = lex_source(src, forge_lexer::tdl_keywords(), false).unwrap();
        let chunked = lex_source(src, forge_lexer::tdl_keywords(), true).unwrap();
        assert_eq!(sequential, chunked);
    }
}
