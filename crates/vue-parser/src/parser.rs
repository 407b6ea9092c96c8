//! Recursive descent parser for Vue templates.
//!
//! Markup structure comes from the token stream; text, attribute values,
//! comments and interpolation contents are read straight from the source and
//! the token cursor is then synchronised past them.

use crate::ast::*;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::{structure, tags};
use smol_str::SmolStr;
use source_map::Span;

/// An opening-tag attribute before directive classification.
#[derive(Debug, Clone)]
pub(crate) struct RawAttribute {
    pub name: SmolStr,
    pub name_offset: u32,
    pub value: Option<AttributeValue>,
    pub span: Span,
}

/// A parsed opening tag.
#[derive(Debug)]
pub(crate) struct StartTag {
    pub tag: SmolStr,
    pub start: u32,
    pub attributes: Vec<RawAttribute>,
    pub self_closing: bool,
    /// Offset past `>`, or where parsing stopped for an unterminated tag.
    pub end: u32,
    pub terminated: bool,
}

/// The template parser.
pub(crate) struct Parser<'src> {
    /// The source being parsed.
    source: &'src str,
    /// The token stream.
    tokens: Vec<Token>,
    /// Current position in the token stream.
    pos: usize,
    /// Parse errors collected during parsing.
    errors: Vec<ParseError>,
    /// Names of the elements currently open, innermost last.
    open_tags: Vec<SmolStr>,
    /// EOF token for when we're past the end.
    eof_token: Token,
}

/// Closing tags match case-insensitively, as in HTML.
fn tag_matches(open: &str, found: &str) -> bool {
    open == found || open.eq_ignore_ascii_case(found)
}

impl<'src> Parser<'src> {
    /// Creates a new parser.
    pub fn new(source: &'src str) -> Self {
        let tokens: Vec<Token> = Lexer::new(source).collect();
        let eof_token = Token {
            kind: TokenKind::Eof,
            span: Span::empty(source.len() as u32),
        };
        Self {
            source,
            tokens,
            pos: 0,
            errors: Vec::new(),
            open_tags: Vec::new(),
            eof_token,
        }
    }

    /// Parses the whole source as template content.
    pub fn parse_fragment(mut self) -> (Fragment, Vec<ParseError>) {
        let nodes = self.parse_nodes();
        let mut errors = self.errors;
        let nodes = structure::fold(nodes, &mut errors);
        let fragment = Fragment {
            nodes,
            span: Span::from_usize(0, self.source.len()),
        };
        (fragment, errors)
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    // === Token helpers ===

    /// Returns the current token.
    pub fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof_token)
    }

    /// Returns the current token kind.
    pub fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Returns the text of the current token.
    fn current_text(&self) -> &'src str {
        let span = self.current().span;
        &self.source[u32::from(span.start) as usize..u32::from(span.end) as usize]
    }

    pub fn current_start(&self) -> u32 {
        u32::from(self.current().span.start)
    }

    fn peek(&self, n: usize) -> &Token {
        self.tokens.get(self.pos + n).unwrap_or(&self.eof_token)
    }

    /// Advances to the next token.
    pub fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Checks if the current token matches the given kind.
    pub fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    /// Advances if the current token matches, returns true if matched.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Reports an error at the current position.
    fn error(&mut self, kind: ParseErrorKind) {
        self.errors.push(ParseError::new(kind, self.current().span));
    }

    pub fn error_at(&mut self, kind: ParseErrorKind, span: Span) {
        self.errors.push(ParseError::new(kind, span));
    }

    /// Moves the token cursor to the first token at or after `offset`.
    ///
    /// A token straddling `offset` is discarded and the rest of the source is
    /// lexed again from `offset`.
    pub fn sync_to(&mut self, offset: u32) {
        while !self.check(TokenKind::Eof) && u32::from(self.current().span.end) <= offset {
            self.advance();
        }
        if !self.check(TokenKind::Eof) && self.current_start() < offset {
            tracing::trace!(offset, "re-lexing from a token boundary");
            let rest = &self.source[offset as usize..];
            let relexed = Lexer::new(rest).map(|token| Token {
                kind: token.kind,
                span: token.span.shift(offset),
            });
            self.tokens.truncate(self.pos);
            self.tokens.extend(relexed);
        }
    }

    /// Returns true if the current `<` starts a tag.
    pub fn at_tag_open(&self) -> bool {
        let next = self.peek(1);
        self.check(TokenKind::LAngle)
            && next.kind == TokenKind::Name
            && next.span.start == self.current().span.end
            && self.source[u32::from(next.span.start) as usize..]
                .starts_with(|c: char| c.is_ascii_alphabetic())
    }

    /// Returns the name of the closing tag at the cursor, or `""`.
    pub fn closing_tag_name(&self) -> &'src str {
        let next = self.peek(1);
        if self.check(TokenKind::LAngleSlash)
            && next.kind == TokenKind::Name
            && next.span.start == self.current().span.end
        {
            &self.source[u32::from(next.span.start) as usize..u32::from(next.span.end) as usize]
        } else {
            ""
        }
    }

    /// Consumes a closing tag through its `>`, returning its span.
    pub fn skip_closing_tag(&mut self) -> Span {
        let start = self.current_start();
        self.advance();
        while !matches!(
            self.current_kind(),
            TokenKind::RAngle
                | TokenKind::Eof
                | TokenKind::LAngle
                | TokenKind::LAngleSlash
                | TokenKind::CommentOpen
        ) {
            self.advance();
        }
        let end = if self.check(TokenKind::RAngle) {
            let end = u32::from(self.current().span.end);
            self.advance();
            end
        } else {
            self.current_start()
        };
        Span::new(start, end)
    }

    // === Nodes ===

    fn parse_nodes(&mut self) -> Vec<TemplateNode> {
        let mut nodes = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::Eof => break,
                TokenKind::LAngleSlash => {
                    let name = self.closing_tag_name();
                    if self.open_tags.iter().any(|open| tag_matches(open, name)) {
                        break;
                    }
                    let tag_name = name.to_string();
                    let span = self.skip_closing_tag();
                    self.error_at(ParseErrorKind::StrayClosingTag { tag_name }, span);
                }
                TokenKind::CommentOpen => nodes.push(self.parse_comment()),
                TokenKind::LAngle if self.at_tag_open() => nodes.push(self.parse_element()),
                TokenKind::MustacheOpen => nodes.push(self.parse_interpolation()),
                _ => nodes.push(self.parse_text()),
            }
        }
        nodes
    }

    /// Parses a comment.
    pub fn parse_comment(&mut self) -> TemplateNode {
        let start = self.current_start() as usize;
        let content_start = start + "<!--".len();
        let (data, end) = match self.source[content_start..].find("-->") {
            Some(rel) => (
                &self.source[content_start..content_start + rel],
                content_start + rel + "-->".len(),
            ),
            None => {
                self.error(ParseErrorKind::Unterminated {
                    construct: "comment",
                });
                (&self.source[content_start..], self.source.len())
            }
        };
        self.sync_to(end as u32);
        TemplateNode::Comment(Comment {
            span: Span::from_usize(start, end),
            data: data.to_string(),
        })
    }

    fn parse_interpolation(&mut self) -> TemplateNode {
        let start = self.current_start() as usize;
        let content_start = start + "{{".len();
        match self.source[content_start..].find("}}") {
            Some(rel) => {
                let content_end = content_start + rel;
                let end = content_end + "}}".len();
                self.sync_to(end as u32);
                TemplateNode::Interpolation(Interpolation {
                    span: Span::from_usize(start, end),
                    expression: ExpressionNode::new(
                        &self.source[content_start..content_end],
                        content_start as u32,
                        false,
                    ),
                })
            }
            None => {
                // An unterminated interpolation is text.
                self.error(ParseErrorKind::Unterminated {
                    construct: "interpolation",
                });
                let end = self.source.len();
                self.sync_to(end as u32);
                TemplateNode::Text(Text {
                    span: Span::from_usize(start, end),
                    data: self.source[start..].to_string(),
                })
            }
        }
    }

    /// Parses text up to the next tag, comment or interpolation.
    pub fn parse_text(&mut self) -> TemplateNode {
        let start = self.current_start() as usize;
        let rest = &self.source[start..];
        let end = rest
            .char_indices()
            .skip(1)
            .find(|&(i, _)| {
                let tail = &rest[i..];
                tail.starts_with("{{")
                    || (tail.starts_with('<')
                        && tail[1..].starts_with(|c: char| c.is_ascii_alphabetic() || c == '/' || c == '!'))
            })
            .map_or(self.source.len(), |(i, _)| start + i);
        self.sync_to(end as u32);
        TemplateNode::Text(Text {
            span: Span::from_usize(start, end),
            data: self.source[start..end].to_string(),
        })
    }

    fn parse_element(&mut self) -> TemplateNode {
        let start_tag = self.parse_start_tag();
        let start = start_tag.start;
        let tag = start_tag.tag;
        let props: Vec<Prop> = start_tag
            .attributes
            .into_iter()
            .map(|raw| match parse_directive(&raw, &mut self.errors) {
                Some(directive) => Prop::Directive(directive),
                None => Prop::Attribute(Attribute {
                    name: raw.name,
                    value: raw.value,
                    span: raw.span,
                }),
            })
            .collect();
        let tag_type = tag_type(&tag, &props);

        let mut children = Vec::new();
        let end = if start_tag.self_closing || !start_tag.terminated || tags::is_void_tag(&tag) {
            start_tag.end
        } else if tags::is_raw_text_tag(&tag) {
            let content_start = start_tag.end as usize;
            let needle = format!("</{}", tag.to_ascii_lowercase());
            let content_end = self.source[content_start..]
                .to_ascii_lowercase()
                .find(&needle)
                .map_or(self.source.len(), |rel| content_start + rel);
            if content_end > content_start {
                children.push(TemplateNode::Text(Text {
                    span: Span::from_usize(content_start, content_end),
                    data: self.source[content_start..content_end].to_string(),
                }));
            }
            self.sync_to(content_end as u32);
            self.parse_closing_tag(&tag, Span::new(start, start_tag.end))
        } else {
            self.open_tags.push(tag.clone());
            children = self.parse_nodes();
            self.open_tags.pop();
            self.parse_closing_tag(&tag, Span::new(start, start_tag.end))
        };

        TemplateNode::Element(Element {
            span: Span::new(start, end),
            tag,
            tag_type,
            props,
            children,
            self_closing: start_tag.self_closing,
            start_tag_end: start_tag.end,
        })
    }

    /// Consumes the closing tag of `tag` and returns the element's end offset.
    ///
    /// When the cursor is at EOF or at an ancestor's closing tag, the element
    /// is reported unclosed and ends where its content stopped.
    fn parse_closing_tag(&mut self, tag: &str, start_tag: Span) -> u32 {
        if self.check(TokenKind::LAngleSlash) && tag_matches(tag, self.closing_tag_name()) {
            return u32::from(self.skip_closing_tag().end);
        }
        self.error_at(
            ParseErrorKind::UnclosedTag {
                tag_name: tag.to_string(),
            },
            start_tag,
        );
        self.current_start()
    }

    /// Parses `<name attrs... >` or `<name attrs... />`.
    pub fn parse_start_tag(&mut self) -> StartTag {
        let start = self.current_start();
        self.advance();
        let tag = SmolStr::new(self.current_text());
        self.advance();
        let attributes = self.parse_attributes();

        let (self_closing, end, terminated) = match self.current_kind() {
            TokenKind::SlashRAngle => {
                let end = u32::from(self.current().span.end);
                self.advance();
                (true, end, true)
            }
            TokenKind::RAngle => {
                let end = u32::from(self.current().span.end);
                self.advance();
                (false, end, true)
            }
            kind => {
                self.error(ParseErrorKind::UnexpectedToken {
                    expected: "'>'".to_string(),
                    found: kind.name().to_string(),
                });
                (false, self.current_start(), false)
            }
        };

        StartTag {
            tag,
            start,
            attributes,
            self_closing,
            end,
            terminated,
        }
    }

    fn parse_attributes(&mut self) -> Vec<RawAttribute> {
        let mut attributes = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::Name => attributes.push(self.parse_attribute()),
                TokenKind::Newline | TokenKind::Slash => self.advance(),
                TokenKind::RAngle
                | TokenKind::SlashRAngle
                | TokenKind::Eof
                | TokenKind::LAngle
                | TokenKind::LAngleSlash
                | TokenKind::CommentOpen => break,
                kind => {
                    self.error(ParseErrorKind::UnexpectedToken {
                        expected: "attribute name".to_string(),
                        found: kind.name().to_string(),
                    });
                    self.advance();
                }
            }
        }
        attributes
    }

    fn parse_attribute(&mut self) -> RawAttribute {
        let name_span = self.current().span;
        let name = SmolStr::new(self.current_text());
        self.advance();

        let mut end = u32::from(name_span.end);
        let mut value = None;
        if self.eat(TokenKind::Eq) {
            while self.eat(TokenKind::Newline) {}
            match self.current_kind() {
                quote @ (TokenKind::DoubleQuote | TokenKind::SingleQuote) => {
                    let quote_char = if quote == TokenKind::DoubleQuote { '"' } else { '\'' };
                    let value_start = u32::from(self.current().span.end) as usize;
                    let value_end = match self.source[value_start..].find(quote_char) {
                        Some(rel) => value_start + rel,
                        None => {
                            self.error(ParseErrorKind::UnexpectedEof {
                                expected: format!("closing {quote_char}"),
                            });
                            self.source.len()
                        }
                    };
                    self.sync_to(value_end as u32);
                    end = if self.eat(quote) {
                        value_end as u32 + 1
                    } else {
                        value_end as u32
                    };
                    value = Some(AttributeValue {
                        content: self.source[value_start..value_end].to_string(),
                        offset: value_start as u32,
                        quoted: true,
                    });
                }
                TokenKind::RAngle | TokenKind::SlashRAngle | TokenKind::Eof => {
                    self.error(ParseErrorKind::UnexpectedToken {
                        expected: "attribute value".to_string(),
                        found: self.current_kind().name().to_string(),
                    });
                }
                _ => {
                    let value_start = self.current_start() as usize;
                    let value_end = self.source[value_start..]
                        .find(|c: char| c.is_ascii_whitespace() || c == '>')
                        .map_or(self.source.len(), |rel| value_start + rel);
                    self.sync_to(value_end as u32);
                    end = value_end as u32;
                    value = Some(AttributeValue {
                        content: self.source[value_start..value_end].to_string(),
                        offset: value_start as u32,
                        quoted: false,
                    });
                }
            }
        }

        RawAttribute {
            name,
            name_offset: u32::from(name_span.start),
            value,
            span: Span::new(name_span.start, end),
        }
    }
}

fn tag_type(tag: &str, props: &[Prop]) -> TagType {
    if tag == "slot" {
        return TagType::Slot;
    }
    if tag == "template" {
        let structural = props.iter().any(|prop| {
            matches!(prop, Prop::Directive(dir) if tags::is_template_directive(&dir.name))
        });
        return if structural {
            TagType::Template
        } else {
            TagType::Element
        };
    }
    let is_attr = props.iter().find_map(|prop| match prop {
        Prop::Attribute(attr) if attr.name == "is" => attr.value.as_ref().map(|v| v.content.as_str()),
        _ => None,
    });
    if tags::is_component_tag(tag, is_attr) {
        TagType::Component
    } else {
        TagType::Element
    }
}

/// Classifies an attribute name as a directive, normalising shorthands.
///
/// Returns `None` for plain attributes.
fn parse_directive(raw: &RawAttribute, errors: &mut Vec<ParseError>) -> Option<Directive> {
    let name = raw.name.as_str();
    let base = raw.name_offset;

    let mut modifiers = Vec::new();
    let (dir_name, arg_start, mut cursor) = if let Some(after) = name.strip_prefix("v-") {
        let len = after.find([':', '.']).unwrap_or(after.len());
        if len == 0 {
            return None;
        }
        let cursor = 2 + len;
        let arg_start = name[cursor..].starts_with(':').then_some(cursor + 1);
        (SmolStr::new(&after[..len]), arg_start, cursor)
    } else {
        let dir_name = match name.as_bytes().first()? {
            b':' => "bind",
            b'@' => "on",
            b'#' => "slot",
            b'.' => {
                modifiers.push(ExpressionNode::new("prop", base, true));
                "bind"
            }
            _ => return None,
        };
        (SmolStr::new(dir_name), Some(1), 1)
    };

    let mut arg = None;
    if let Some(arg_start) = arg_start {
        let rest = &name[arg_start..];
        if let Some(dynamic) = rest.strip_prefix('[') {
            match dynamic.find(']') {
                Some(close) => {
                    arg = Some(ExpressionNode::new(
                        &dynamic[..close],
                        base + arg_start as u32 + 1,
                        false,
                    ));
                    cursor = arg_start + close + 2;
                }
                None => {
                    errors.push(ParseError::new(
                        ParseErrorKind::InvalidDirective {
                            message: format!("missing `]` in dynamic argument of {name}"),
                        },
                        raw.span,
                    ));
                    arg = Some(ExpressionNode::new(dynamic, base + arg_start as u32 + 1, false));
                    cursor = name.len();
                }
            }
        } else {
            // Slot names keep their dots.
            let len = if dir_name == "slot" {
                rest.len()
            } else {
                rest.find('.').unwrap_or(rest.len())
            };
            if len > 0 {
                arg = Some(ExpressionNode::new(&rest[..len], base + arg_start as u32, true));
            }
            cursor = arg_start + len;
        }
    }

    // The first split part precedes the leading dot.
    let mut offset = cursor;
    for part in name[cursor..].split('.') {
        if !part.is_empty() {
            modifiers.push(ExpressionNode::new(part, base + offset as u32, true));
        }
        offset += part.len() + 1;
    }
    let exp = raw
        .value
        .as_ref()
        .filter(|value| !value.content.trim().is_empty())
        .map(|value| ExpressionNode::new(value.content.as_str(), value.offset, false));

    Some(Directive {
        name: dir_name,
        raw_name: name.to_string(),
        arg,
        exp,
        modifiers,
        span: raw.span,
    })
}
