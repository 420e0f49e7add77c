#![forbid(unsafe_code)]

//! CSS selectors over any [`Document`].
//!
//! Parsing and matching go through Servo's `selectors` crate, so tour targets
//! accept what `querySelector` accepts: sibling combinators, `:not()`,
//! `:is()`, `:first-child`, escaped strings and the rest of Selectors Level 4
//! short of state pseudo-classes such as `:hover`. Elements are presented to
//! the matcher as [`DocElement`] views over the host document.

use std::fmt;

use cssparser::{
    CssStringWriter, ParseError, ParseErrorKind, Parser as CssParser, ParserInput,
    SourceLocation, ToCss, Token, serialize_identifier,
};
use selectors::NthIndexCache;
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::context::QuirksMode;
use selectors::matching::{
    ElementSelectorFlags, IgnoreNthChildForInvalidation, MatchingContext, MatchingMode,
    NeedsSelectorFlags, matches_selector_list,
};
use selectors::parser::{
    ParseRelative, Parser as SelParser, SelectorImpl, SelectorList, SelectorParseErrorKind,
};
use selectors::{Element as ServoElement, OpaqueElement};

use crate::document::{Document, NodeId};

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// A parsed selector list.
#[derive(Clone)]
pub struct Selector {
    source: String,
    list: SelectorList<TourSelectors>,
    /// Top-level `[name=value]` conditions, lower-case names, source order.
    equalities: Vec<(String, String)>,
}

/// Syntax error in a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError {
    pub input: String,
    /// Byte offset of the error.
    pub position: usize,
    pub message: String,
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid selector {:?} at byte {}: {}",
            self.input, self.position, self.message
        )
    }
}

impl std::error::Error for SelectorError {}

impl Selector {
    /// Parse a selector list.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut parser_input = ParserInput::new(input);
        let mut parser = CssParser::new(&mut parser_input);
        let list = SelectorList::parse(&TourParser, &mut parser, ParseRelative::No)
            .map_err(|err| selector_error(input, err))?;
        Ok(Self {
            source: input.trim().to_string(),
            list,
            equalities: equality_conditions(input),
        })
    }

    /// The selector text as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `node` matches any alternative of the list.
    pub fn matches<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        self.first_match(doc, [node]).is_some()
    }

    /// The first of `candidates` that matches.
    pub fn first_match<D, I>(&self, doc: &D, candidates: I) -> Option<NodeId>
    where
        D: Document + ?Sized,
        I: IntoIterator<Item = NodeId>,
    {
        let mut matcher = Matcher::new(doc);
        candidates
            .into_iter()
            .find(|&node| matcher.matches(&self.list, node))
    }

    /// Every one of `candidates` that matches, in the order given.
    pub fn filter<D, I>(&self, doc: &D, candidates: I) -> Vec<NodeId>
    where
        D: Document + ?Sized,
        I: IntoIterator<Item = NodeId>,
    {
        let mut matcher = Matcher::new(doc);
        candidates
            .into_iter()
            .filter(|&node| matcher.matches(&self.list, node))
            .collect()
    }

    /// Value of the first top-level `=` attribute condition, optionally
    /// restricted to one attribute name.
    ///
    /// For `[data-tour="kpi-cards"]` this is `Some("kpi-cards")`. Conditions
    /// nested in functional pseudo-classes such as `:not()` do not count.
    #[must_use]
    pub fn attribute_value(&self, name: Option<&str>) -> Option<&str> {
        self.equalities
            .iter()
            .find(|(attr, _)| name.is_none_or(|n| attr.eq_ignore_ascii_case(n)))
            .map(|(_, value)| value.as_str())
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Selector {}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Selector").field(&self.source).finish()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn selector_error(input: &str, err: ParseError<'_, SelectorParseErrorKind<'_>>) -> SelectorError {
    let message = match &err.kind {
        ParseErrorKind::Basic(kind) => format!("{kind:?}"),
        ParseErrorKind::Custom(kind) => format!("{kind:?}"),
    };
    SelectorError {
        input: input.to_string(),
        position: byte_offset(input, err.location),
        message,
    }
}

/// Byte offset of a parser location (0-based line, 1-based UTF-16 column).
fn byte_offset(input: &str, location: SourceLocation) -> usize {
    let mut line = 0;
    let mut column = 1;
    let mut chars = input.char_indices().peekable();
    while let Some((offset, ch)) = chars.next() {
        if line == location.line && column >= location.column {
            return offset;
        }
        match ch {
            '\r' => {
                if matches!(chars.peek(), Some((_, '\n'))) {
                    chars.next();
                }
                line += 1;
                column = 1;
            }
            '\n' | '\x0C' => {
                line += 1;
                column = 1;
            }
            _ => column += ch.len_utf16() as u32,
        }
    }
    input.len()
}

fn equality_conditions(source: &str) -> Vec<(String, String)> {
    let mut input = ParserInput::new(source);
    let mut parser = CssParser::new(&mut input);
    let mut found = Vec::new();
    while let Ok(token) = parser.next() {
        if !matches!(token, Token::SquareBracketBlock) {
            continue;
        }
        if let Ok(Some(condition)) = parser.parse_nested_block(equality_condition) {
            found.push(condition);
        }
    }
    found
}

fn equality_condition<'i>(
    block: &mut CssParser<'i, '_>,
) -> Result<Option<(String, String)>, ParseError<'i, ()>> {
    let name = match block.next() {
        Ok(Token::Ident(name)) => name.to_ascii_lowercase(),
        _ => return Ok(None),
    };
    if !matches!(block.next(), Ok(Token::Delim('='))) {
        return Ok(None);
    }
    Ok(match block.next() {
        Ok(Token::Ident(value) | Token::QuotedString(value)) => Some((name, str::to_owned(value))),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Selector implementation
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct CssIdent(pub String);

impl AsRef<str> for CssIdent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for CssIdent {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<'a> From<&'a str> for CssIdent {
    fn from(s: &'a str) -> Self {
        Self(s.to_owned())
    }
}

impl ToCss for CssIdent {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        serialize_identifier(&self.0, dest)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct CssAttrValue(pub String);

impl AsRef<str> for CssAttrValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'a> From<&'a str> for CssAttrValue {
    fn from(s: &'a str) -> Self {
        Self(s.to_owned())
    }
}

impl ToCss for CssAttrValue {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        use std::fmt::Write;
        write!(CssStringWriter::new(dest), "{}", &self.0)
    }
}

/// Selector flavour for tour targets: HTML names, no state pseudo-classes
/// and no pseudo-elements.
#[derive(Clone, Debug)]
pub enum TourSelectors {}

impl SelectorImpl for TourSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = CssAttrValue;
    type Identifier = CssIdent;
    type LocalName = CssIdent;
    type NamespaceUrl = CssIdent;
    type NamespacePrefix = CssIdent;
    type BorrowedNamespaceUrl = str;
    type BorrowedLocalName = str;
    type NonTSPseudoClass = Unsupported;
    type PseudoElement = Unsupported;
}

/// Uninhabited: `:hover`, `::before` and friends fail to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {}

impl ToCss for Unsupported {
    fn to_css<W>(&self, _dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        match *self {}
    }
}

impl selectors::parser::NonTSPseudoClass for Unsupported {
    type Impl = TourSelectors;

    fn is_active_or_hover(&self) -> bool {
        match *self {}
    }

    fn is_user_action_state(&self) -> bool {
        match *self {}
    }
}

impl selectors::parser::PseudoElement for Unsupported {
    type Impl = TourSelectors;

    fn accepts_state_pseudo_classes(&self) -> bool {
        match *self {}
    }

    fn valid_after_slotted(&self) -> bool {
        match *self {}
    }
}

struct TourParser;

impl<'i> SelParser<'i> for TourParser {
    type Impl = TourSelectors;
    type Error = SelectorParseErrorKind<'i>;
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Matching state shared across the candidates of one query.
struct Matcher<'d, D: ?Sized> {
    doc: &'d D,
    /// One byte per node index; its address is the node's [`OpaqueElement`].
    anchors: Vec<u8>,
    nth_cache: NthIndexCache,
}

impl<'d, D: Document + ?Sized> Matcher<'d, D> {
    fn new(doc: &'d D) -> Self {
        Self {
            doc,
            anchors: vec![0; doc.node_bound().max(1)],
            nth_cache: NthIndexCache::default(),
        }
    }

    fn matches(&mut self, list: &SelectorList<TourSelectors>, node: NodeId) -> bool {
        if self.doc.tag_name(node).is_none() {
            return false;
        }
        let element = DocElement {
            doc: self.doc,
            node,
            anchors: &self.anchors,
        };
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut self.nth_cache,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            IgnoreNthChildForInvalidation::No,
        );
        matches_selector_list(list, &element, &mut context)
    }
}

/// Shared identity for handles past [`Document::node_bound`].
static OUT_OF_RANGE: u8 = 0;

/// One element of a [`Document`], as the selector matcher sees it.
pub struct DocElement<'a, D: ?Sized> {
    doc: &'a D,
    node: NodeId,
    anchors: &'a [u8],
}

impl<D: ?Sized> Clone for DocElement<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: ?Sized> Copy for DocElement<'_, D> {}

impl<D: ?Sized> fmt::Debug for DocElement<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DocElement").field(&self.node).finish()
    }
}

impl<'a, D: Document + ?Sized> DocElement<'a, D> {
    fn with(&self, node: NodeId) -> Self {
        Self { node, ..*self }
    }

    fn tag(&self) -> &'a str {
        self.doc.tag_name(self.node).unwrap_or_default()
    }

    /// Attached siblings including this element, and this element's index.
    fn siblings(&self) -> Option<(Vec<NodeId>, usize)> {
        let parent = self.doc.parent(self.node)?;
        let siblings = self.doc.children(parent);
        let index = siblings.iter().position(|&n| n == self.node)?;
        Some((siblings, index))
    }
}

fn eq_case(a: &str, b: &str, case: CaseSensitivity) -> bool {
    match case {
        CaseSensitivity::CaseSensitive => a == b,
        CaseSensitivity::AsciiCaseInsensitive => a.eq_ignore_ascii_case(b),
    }
}

impl<D: Document + ?Sized> ServoElement for DocElement<'_, D> {
    type Impl = TourSelectors;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.anchors.get(self.node.index()).unwrap_or(&OUT_OF_RANGE))
    }

    fn parent_element(&self) -> Option<Self> {
        self.doc.parent(self.node).map(|parent| self.with(parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let (siblings, index) = self.siblings()?;
        let prev = siblings.get(index.checked_sub(1)?)?;
        Some(self.with(*prev))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let (siblings, index) = self.siblings()?;
        siblings.get(index + 1).map(|&next| self.with(next))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.doc
            .children(self.node)
            .first()
            .map(|&child| self.with(child))
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &str) -> bool {
        self.tag().eq_ignore_ascii_case(name)
    }

    fn has_namespace(&self, _ns: &str) -> bool {
        true
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.tag().eq_ignore_ascii_case(other.tag())
    }

    fn attr_matches(
        &self,
        _ns: &NamespaceConstraint<&<Self::Impl as SelectorImpl>::NamespaceUrl>,
        local_name: &<Self::Impl as SelectorImpl>::LocalName,
        operation: &AttrSelectorOperation<&<Self::Impl as SelectorImpl>::AttrValue>,
    ) -> bool {
        self.doc
            .attribute(self.node, local_name.as_ref())
            .is_some_and(|value| operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &<Self::Impl as SelectorImpl>::NonTSPseudoClass,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match *pc {}
    }

    fn match_pseudo_element(
        &self,
        pe: &<Self::Impl as SelectorImpl>::PseudoElement,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match *pe {}
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        self.tag() == "a" && self.doc.attribute(self.node, "href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn imported_part(
        &self,
        _name: &<Self::Impl as SelectorImpl>::Identifier,
    ) -> Option<<Self::Impl as SelectorImpl>::Identifier> {
        None
    }

    fn is_part(&self, _name: &<Self::Impl as SelectorImpl>::Identifier) -> bool {
        false
    }

    fn has_id(&self, id: &<Self::Impl as SelectorImpl>::Identifier, case: CaseSensitivity) -> bool {
        self.doc
            .attribute(self.node, "id")
            .is_some_and(|value| eq_case(value, id.as_ref(), case))
    }

    fn has_class(
        &self,
        name: &<Self::Impl as SelectorImpl>::Identifier,
        case: CaseSensitivity,
    ) -> bool {
        self.doc.attribute(self.node, "class").is_some_and(|classes| {
            classes
                .split_whitespace()
                .any(|class| eq_case(class, name.as_ref(), case))
        })
    }

    fn is_empty(&self) -> bool {
        self.doc.children(self.node).is_empty() && self.doc.text_content(self.node).is_empty()
    }

    fn is_root(&self) -> bool {
        self.node == self.doc.root()
    }
}
