//! Vue template lexer using logos.
//!
//! The token stream only needs to find markup structure: tag delimiters,
//! attribute names, quotes and interpolation braces. Text, attribute values
//! and interpolation contents are read back from the source by the parser.

use logos::Logos;
use source_map::Span;
use text_size::TextSize;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span of the token in the source.
    pub span: Span,
}

/// Token kinds for Vue template syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Default)]
#[logos(skip r"[ \t\r\f]+")]
pub enum TokenKind {
    /// `<!--`
    #[token("<!--", priority = 12)]
    CommentOpen,

    /// `</`
    #[token("</", priority = 11)]
    LAngleSlash,

    /// `<`
    #[token("<", priority = 10)]
    LAngle,

    /// `>`
    #[token(">", priority = 10)]
    RAngle,

    /// `/>`
    #[token("/>", priority = 11)]
    SlashRAngle,

    /// `/`
    #[token("/", priority = 10)]
    Slash,

    /// `=`
    #[token("=", priority = 10)]
    Eq,

    /// `"`
    #[token("\"", priority = 10)]
    DoubleQuote,

    /// `'`
    #[token("'", priority = 10)]
    SingleQuote,

    /// `{{`
    #[token("{{", priority = 11)]
    MustacheOpen,

    /// `}}`
    #[token("}}", priority = 11)]
    MustacheClose,

    /// A single brace outside an interpolation.
    #[regex(r"[{}]", priority = 2)]
    Brace,

    /// Newline (significant for whitespace handling).
    #[token("\n", priority = 10)]
    Newline,

    /// A run of characters that can form a tag or attribute name.
    #[regex(r#"[^ \t\r\n\f"'<>/={}]+"#, priority = 4)]
    Name,

    /// End of file.
    Eof,

    /// Error token.
    #[default]
    Error,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::CommentOpen => "'<!--'",
            TokenKind::LAngleSlash => "'</'",
            TokenKind::LAngle => "'<'",
            TokenKind::RAngle => "'>'",
            TokenKind::SlashRAngle => "'/>'",
            TokenKind::Slash => "'/'",
            TokenKind::Eq => "'='",
            TokenKind::DoubleQuote => "'\"'",
            TokenKind::SingleQuote => "'''",
            TokenKind::MustacheOpen => "'{{'",
            TokenKind::MustacheClose => "'}}'",
            TokenKind::Brace => "brace",
            TokenKind::Newline => "newline",
            TokenKind::Name => "name",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid token",
        }
    }
}

/// A lexer for Vue templates.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source: &'src str,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            source,
            finished: false,
        }
    }

    /// Returns the source string being lexed.
    pub fn source(&self) -> &'src str {
        self.source
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let kind = match self.inner.next() {
            Some(Ok(kind)) => kind,
            Some(Err(())) => TokenKind::Error,
            None => {
                self.finished = true;
                let end = TextSize::from(self.source.len() as u32);
                return Some(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(end, end),
                });
            }
        };
        let range = self.inner.span();
        Some(Token {
            kind,
            span: Span::from_usize(range.start, range.end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokenize(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .map(|t| t.kind)
            .filter(|k| *k != TokenKind::Eof)
            .collect()
    }

    #[test]
    fn test_simple_tag() {
        assert_eq!(
            tokenize("<div>"),
            vec![TokenKind::LAngle, TokenKind::Name, TokenKind::RAngle]
        );
    }

    #[test]
    fn test_self_closing_tag() {
        assert_eq!(
            tokenize("<br/>"),
            vec![TokenKind::LAngle, TokenKind::Name, TokenKind::SlashRAngle]
        );
    }

    #[test]
    fn test_closing_tag() {
        assert_eq!(
            tokenize("</div>"),
            vec![TokenKind::LAngleSlash, TokenKind::Name, TokenKind::RAngle]
        );
    }

    #[test]
    fn test_directive_attribute() {
        assert_eq!(
            tokenize(r#"<a :href="url" @click.stop="go">"#),
            vec![
                TokenKind::LAngle,
                TokenKind::Name,
                TokenKind::Name,
                TokenKind::Eq,
                TokenKind::DoubleQuote,
                TokenKind::Name,
                TokenKind::DoubleQuote,
                TokenKind::Name,
                TokenKind::Eq,
                TokenKind::DoubleQuote,
                TokenKind::Name,
                TokenKind::DoubleQuote,
                TokenKind::RAngle,
            ]
        );
    }

    #[test]
    fn test_interpolation() {
        assert_eq!(
            tokenize("{{ count }}"),
            vec![
                TokenKind::MustacheOpen,
                TokenKind::Name,
                TokenKind::MustacheClose
            ]
        );
    }

    #[test]
    fn test_comment_open() {
        assert_eq!(tokenize("<!--")[0], TokenKind::CommentOpen);
    }

    #[test]
    fn test_lone_braces() {
        assert_eq!(
            tokenize("{ }"),
            vec![TokenKind::Brace, TokenKind::Brace]
        );
    }

    #[test]
    fn test_spans() {
        let tokens: Vec<Token> = Lexer::new("<p>\n</p>").collect();
        assert_eq!(tokens[3].kind, TokenKind::Newline);
        assert_eq!(tokens[4].span, Span::new(4u32, 6u32));
    }
}
