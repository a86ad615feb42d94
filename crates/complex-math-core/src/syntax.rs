//! General expression grammar.
//!
//! The parser accepts a broad, Python-shaped expression language (comparisons,
//! bitwise operators, attribute access, subscripts, collections, keyword
//! arguments, conditionals, lambdas, comprehensions). Nothing here decides
//! what may be evaluated: the resulting [`Node`] tree is handed to
//! [`crate::ast::Expr::lower`], which accepts only the whitelisted node kinds.

use crate::error::EvalError;
use crate::lexer::{tokenize, Token};

/// Maximum depth of the syntax tree.
pub const MAX_DEPTH: usize = 500;

/// Maximum nesting of parentheses, brackets, unary prefixes and call
/// arguments. Each level costs a full descent through the precedence
/// ladder, so this must stay well inside a 2 MiB thread stack.
pub const MAX_NESTING: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Invert,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    MatMul,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    NotEq,
    In,
    NotIn,
    Is,
    IsNot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Number(f64),
    Imaginary,
    Str(String),
    Name(String),
    Unary {
        op: UnaryOperator,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    Compare {
        op: CompareOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
        keywords: Vec<(String, Node)>,
    },
    Attribute {
        value: Box<Node>,
        attr: String,
    },
    Subscript {
        value: Box<Node>,
        index: Box<Node>,
    },
    /// Tuples, lists, sets and dict displays.
    Collection(Vec<Node>),
    /// Conditionals, lambdas, comprehensions, slices, named expressions and
    /// starred items. Only the children are kept.
    Other(Vec<Node>),
}

/// A syntax tree node together with the depth of the subtree it roots.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub depth: usize,
}

impl Node {
    fn new(kind: NodeKind) -> Result<Self, EvalError> {
        let children = match &kind {
            NodeKind::Number(_) | NodeKind::Imaginary | NodeKind::Str(_) | NodeKind::Name(_) => 0,
            NodeKind::Unary { operand, .. } => operand.depth,
            NodeKind::Binary { left, right, .. } | NodeKind::Compare { left, right, .. } => {
                left.depth.max(right.depth)
            }
            NodeKind::Call {
                callee,
                args,
                keywords,
            } => args
                .iter()
                .chain(keywords.iter().map(|(_, node)| node))
                .map(|node| node.depth)
                .fold(callee.depth, usize::max),
            NodeKind::Attribute { value, .. } => value.depth,
            NodeKind::Subscript { value, index } => value.depth.max(index.depth),
            NodeKind::Collection(items) | NodeKind::Other(items) => {
                items.iter().map(|node| node.depth).max().unwrap_or(0)
            }
        };
        let depth = children + 1;
        if depth > MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        Ok(Self { kind, depth })
    }
}

/// Parse `source` into a syntax tree.
///
/// # Errors
///
/// Returns [`EvalError::InvalidSyntax`] when the text is not an expression
/// and [`EvalError::TooDeep`] when it nests beyond [`MAX_DEPTH`] or
/// [`MAX_NESTING`].
pub fn parse(source: &str) -> Result<Node, EvalError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        nesting: 0,
    };
    if parser.peek() == &Token::Eof {
        return Err(EvalError::InvalidSyntax);
    }
    let first = parser.expression()?;
    let node = parser.list_tail(first, &Token::Eof, Parser::expression)?;
    parser.expect(&Token::Eof)?;
    Ok(node)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    nesting: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), EvalError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(EvalError::InvalidSyntax)
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        self.keyword_at(0, keyword)
    }

    fn keyword_at(&self, offset: usize, keyword: &str) -> bool {
        matches!(self.peek_at(offset), Token::Name(name) if name == keyword)
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return Err(EvalError::TooDeep);
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    /// Continue `first` with `(',' item)* [',']` up to `close`. A comma
    /// makes a collection.
    fn list_tail(
        &mut self,
        first: Node,
        close: &Token,
        item: fn(&mut Self) -> Result<Node, EvalError>,
    ) -> Result<Node, EvalError> {
        if self.peek() != &Token::Comma {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            if self.peek() == close {
                break;
            }
            items.push(item(self)?);
        }
        Node::new(NodeKind::Collection(items))
    }

    /// `lambda`, or `or_test ['if' or_test 'else' expression]`.
    fn expression(&mut self) -> Result<Node, EvalError> {
        if self.is_keyword("lambda") {
            return self.lambda();
        }
        let body = self.or_test()?;
        if !self.is_keyword("if") {
            return Ok(body);
        }
        self.advance();
        self.enter()?;
        let test = self.or_test()?;
        if !self.is_keyword("else") {
            return Err(EvalError::InvalidSyntax);
        }
        self.advance();
        let orelse = self.expression()?;
        self.leave();
        Node::new(NodeKind::Other(vec![body, test, orelse]))
    }

    fn lambda(&mut self) -> Result<Node, EvalError> {
        self.advance();
        self.enter()?;
        let mut children = Vec::new();
        while self.peek() != &Token::Colon {
            let starred = self.eat(&Token::Star) || self.eat(&Token::DoubleStar);
            if matches!(self.peek(), Token::Name(name) if !is_reserved(name)) {
                self.advance();
                if self.eat(&Token::Assign) {
                    children.push(self.expression()?);
                }
            } else if !(starred && self.peek() == &Token::Comma) {
                return Err(EvalError::InvalidSyntax);
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::Colon)?;
        children.push(self.expression()?);
        self.leave();
        Node::new(NodeKind::Other(children))
    }

    /// `name ':=' expression` where a parenthesised or listed item is allowed.
    fn named_expression(&mut self) -> Result<Node, EvalError> {
        if !matches!((self.peek(), self.peek_at(1)), (Token::Name(_), Token::Walrus)) {
            return self.expression();
        }
        let target = self.atom()?;
        self.advance();
        self.enter()?;
        let value = self.expression()?;
        self.leave();
        Node::new(NodeKind::Other(vec![target, value]))
    }

    /// An element of a display or call: `*expr` or a named expression.
    fn item(&mut self) -> Result<Node, EvalError> {
        if !self.eat(&Token::Star) {
            return self.named_expression();
        }
        self.enter()?;
        let value = self.bit_or()?;
        self.leave();
        Node::new(NodeKind::Other(vec![value]))
    }

    /// `('for' targets 'in' or_test ('if' or_test)*)+` after `element`.
    fn comprehension(&mut self, element: Vec<Node>) -> Result<Node, EvalError> {
        let mut children = element;
        while self.is_keyword("for") {
            self.advance();
            children.push(self.targets()?);
            if !self.is_keyword("in") {
                return Err(EvalError::InvalidSyntax);
            }
            self.advance();
            children.push(self.or_test()?);
            while self.is_keyword("if") {
                self.advance();
                children.push(self.or_test()?);
            }
        }
        Node::new(NodeKind::Other(children))
    }

    /// Loop targets up to `in`. Parsed below comparisons so `in` is not
    /// taken as an operator.
    fn targets(&mut self) -> Result<Node, EvalError> {
        let first = self.target()?;
        if self.peek() != &Token::Comma {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma) && !self.is_keyword("in") {
            items.push(self.target()?);
        }
        Node::new(NodeKind::Collection(items))
    }

    fn target(&mut self) -> Result<Node, EvalError> {
        if !self.eat(&Token::Star) {
            return self.bit_or();
        }
        let target = self.bit_or()?;
        Node::new(NodeKind::Other(vec![target]))
    }

    fn or_test(&mut self) -> Result<Node, EvalError> {
        let mut left = self.and_test()?;
        while self.is_keyword("or") {
            self.advance();
            let right = self.and_test()?;
            left = binary(BinaryOperator::Or, left, right)?;
        }
        Ok(left)
    }

    fn and_test(&mut self) -> Result<Node, EvalError> {
        let mut left = self.not_test()?;
        while self.is_keyword("and") {
            self.advance();
            let right = self.not_test()?;
            left = binary(BinaryOperator::And, left, right)?;
        }
        Ok(left)
    }

    fn not_test(&mut self) -> Result<Node, EvalError> {
        if self.is_keyword("not") {
            self.advance();
            self.enter()?;
            let operand = self.not_test()?;
            self.leave();
            return unary(UnaryOperator::Not, operand);
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Node, EvalError> {
        let mut left = self.bit_or()?;
        loop {
            // Width in tokens: `not in` and `is not` take two.
            let (op, width) = match self.peek() {
                Token::Lt => (CompareOperator::Lt, 1),
                Token::Gt => (CompareOperator::Gt, 1),
                Token::Le => (CompareOperator::Le, 1),
                Token::Ge => (CompareOperator::Ge, 1),
                Token::EqEq => (CompareOperator::Eq, 1),
                Token::NotEq => (CompareOperator::NotEq, 1),
                Token::Name(name) if name == "in" => (CompareOperator::In, 1),
                Token::Name(name) if name == "not" && self.keyword_at(1, "in") => {
                    (CompareOperator::NotIn, 2)
                }
                Token::Name(name) if name == "is" && self.keyword_at(1, "not") => {
                    (CompareOperator::IsNot, 2)
                }
                Token::Name(name) if name == "is" => (CompareOperator::Is, 1),
                _ => return Ok(left),
            };
            self.pos += width;
            let right = self.bit_or()?;
            left = Node::new(NodeKind::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            })?;
        }
    }

    fn bit_or(&mut self) -> Result<Node, EvalError> {
        let mut left = self.bit_xor()?;
        while self.eat(&Token::Pipe) {
            let right = self.bit_xor()?;
            left = binary(BinaryOperator::BitOr, left, right)?;
        }
        Ok(left)
    }

    fn bit_xor(&mut self) -> Result<Node, EvalError> {
        let mut left = self.bit_and()?;
        while self.eat(&Token::Caret) {
            let right = self.bit_and()?;
            left = binary(BinaryOperator::BitXor, left, right)?;
        }
        Ok(left)
    }

    fn bit_and(&mut self) -> Result<Node, EvalError> {
        let mut left = self.shift()?;
        while self.eat(&Token::Amp) {
            let right = self.shift()?;
            left = binary(BinaryOperator::BitAnd, left, right)?;
        }
        Ok(left)
    }

    fn shift(&mut self) -> Result<Node, EvalError> {
        let mut left = self.arith()?;
        loop {
            let op = match self.peek() {
                Token::Shl => BinaryOperator::Shl,
                Token::Shr => BinaryOperator::Shr,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.arith()?;
            left = binary(op, left, right)?;
        }
    }

    fn arith(&mut self) -> Result<Node, EvalError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.term()?;
            left = binary(op, left, right)?;
        }
    }

    fn term(&mut self) -> Result<Node, EvalError> {
        let mut left = self.factor()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOperator::Mul,
                Token::Slash => BinaryOperator::Div,
                Token::DoubleSlash => BinaryOperator::FloorDiv,
                Token::Percent => BinaryOperator::Mod,
                Token::At => BinaryOperator::MatMul,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.factor()?;
            left = binary(op, left, right)?;
        }
    }

    fn factor(&mut self) -> Result<Node, EvalError> {
        let op = match self.peek() {
            Token::Plus => UnaryOperator::Plus,
            Token::Minus => UnaryOperator::Minus,
            Token::Tilde => UnaryOperator::Invert,
            _ => return self.power(),
        };
        self.advance();
        self.enter()?;
        let operand = self.factor()?;
        self.leave();
        unary(op, operand)
    }

    /// `**` binds tighter than a unary operator on its left and is
    /// right-associative through `factor` on its right.
    fn power(&mut self) -> Result<Node, EvalError> {
        let base = self.postfix()?;
        if !self.eat(&Token::DoubleStar) {
            return Ok(base);
        }
        self.enter()?;
        let exponent = self.factor()?;
        self.leave();
        binary(BinaryOperator::Pow, base, exponent)
    }

    fn postfix(&mut self) -> Result<Node, EvalError> {
        let mut node = self.atom()?;
        loop {
            match self.peek() {
                Token::LParen => {
                    self.advance();
                    self.enter()?;
                    let (args, keywords) = self.call_arguments()?;
                    self.leave();
                    node = Node::new(NodeKind::Call {
                        callee: Box::new(node),
                        args,
                        keywords,
                    })?;
                }
                Token::Dot => {
                    self.advance();
                    let Token::Name(attr) = self.advance() else {
                        return Err(EvalError::InvalidSyntax);
                    };
                    node = Node::new(NodeKind::Attribute {
                        value: Box::new(node),
                        attr,
                    })?;
                }
                Token::LBracket => {
                    self.advance();
                    self.enter()?;
                    if self.peek() == &Token::RBracket {
                        return Err(EvalError::InvalidSyntax);
                    }
                    let first = self.slice()?;
                    let index = self.list_tail(first, &Token::RBracket, Self::slice)?;
                    self.expect(&Token::RBracket)?;
                    self.leave();
                    node = Node::new(NodeKind::Subscript {
                        value: Box::new(node),
                        index: Box::new(index),
                    })?;
                }
                _ => return Ok(node),
            }
        }
    }

    /// Arguments after an opening `(`, consuming the closing `)`.
    fn call_arguments(&mut self) -> Result<(Vec<Node>, Vec<(String, Node)>), EvalError> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        while self.peek() != &Token::RParen {
            if let (Token::Name(name), Token::Assign) = (self.peek(), self.peek_at(1)) {
                let name = name.clone();
                self.advance();
                self.advance();
                keywords.push((name, self.expression()?));
            } else if self.eat(&Token::DoubleStar) {
                // `**mapping` unpacks into keyword arguments.
                keywords.push((String::new(), self.expression()?));
            } else if self.peek() == &Token::Star {
                args.push(self.item()?);
            } else if keywords.is_empty() {
                let arg = self.named_expression()?;
                if args.is_empty() && self.is_keyword("for") {
                    // A generator must be the sole argument.
                    args.push(self.comprehension(vec![arg])?);
                    break;
                }
                args.push(arg);
            } else {
                // Positional argument follows keyword argument.
                return Err(EvalError::InvalidSyntax);
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;
        Ok((args, keywords))
    }

    /// A subscript element: `[lower] ':' [upper] [':' [step]]` or an item.
    fn slice(&mut self) -> Result<Node, EvalError> {
        let mut bounds = Vec::new();
        if self.peek() != &Token::Colon {
            let index = self.item()?;
            if self.peek() != &Token::Colon {
                return Ok(index);
            }
            bounds.push(index);
        }
        for _ in 0..2 {
            if !self.eat(&Token::Colon) {
                break;
            }
            if !matches!(self.peek(), Token::Colon | Token::Comma | Token::RBracket) {
                bounds.push(self.expression()?);
            }
        }
        Node::new(NodeKind::Other(bounds))
    }

    fn atom(&mut self) -> Result<Node, EvalError> {
        match self.advance() {
            Token::Number(value) => Node::new(NodeKind::Number(value)),
            Token::Imaginary => Node::new(NodeKind::Imaginary),
            Token::Str(mut text) => {
                // Adjacent string literals concatenate.
                while let Token::Str(next) = self.peek() {
                    text.push_str(next);
                    self.advance();
                }
                Node::new(NodeKind::Str(text))
            }
            Token::Name(name) if is_reserved(&name) => Err(EvalError::InvalidSyntax),
            Token::Name(name) => Node::new(NodeKind::Name(name)),
            Token::LParen => self.enclosed(&Token::RParen, true),
            Token::LBracket => self.enclosed(&Token::RBracket, false),
            Token::LBrace => self.dict_or_set(),
            _ => Err(EvalError::InvalidSyntax),
        }
    }

    /// Parenthesised expression, tuple or list after its opening token.
    fn enclosed(&mut self, close: &Token, parenthesised: bool) -> Result<Node, EvalError> {
        self.enter()?;
        let node = if self.peek() == close {
            Node::new(NodeKind::Collection(Vec::new()))?
        } else {
            let first = self.item()?;
            if self.is_keyword("for") {
                self.comprehension(vec![first])?
            } else {
                let inner = self.list_tail(first, close, Self::item)?;
                if parenthesised || matches!(inner.kind, NodeKind::Collection(_)) {
                    inner
                } else {
                    Node::new(NodeKind::Collection(vec![inner]))?
                }
            }
        };
        self.expect(close)?;
        self.leave();
        Ok(node)
    }

    fn dict_or_set(&mut self) -> Result<Node, EvalError> {
        self.enter()?;
        let mut items = Vec::new();
        while self.peek() != &Token::RBrace {
            let first = items.is_empty();
            if self.eat(&Token::DoubleStar) {
                items.push(self.bit_or()?);
            } else {
                items.push(self.item()?);
                if self.eat(&Token::Colon) {
                    items.push(self.expression()?);
                }
            }
            if first && self.is_keyword("for") {
                let node = self.comprehension(items)?;
                self.expect(&Token::RBrace)?;
                self.leave();
                return Ok(node);
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RBrace)?;
        self.leave();
        Node::new(NodeKind::Collection(items))
    }
}

/// Keywords that can never start an operand.
fn is_reserved(name: &str) -> bool {
    matches!(
        name,
        "and"
            | "or"
            | "not"
            | "if"
            | "else"
            | "for"
            | "in"
            | "is"
            | "lambda"
            | "import"
            | "from"
            | "yield"
            | "await"
            | "def"
            | "class"
            | "return"
            | "del"
            | "pass"
            | "with"
            | "as"
            | "while"
            | "global"
            | "nonlocal"
            | "assert"
            | "raise"
            | "try"
            | "except"
            | "finally"
            | "break"
            | "continue"
            | "elif"
    )
}

fn unary(op: UnaryOperator, operand: Node) -> Result<Node, EvalError> {
    Node::new(NodeKind::Unary {
        op,
        operand: Box::new(operand),
    })
}

fn binary(op: BinaryOperator, left: Node, right: Node) -> Result<Node, EvalError> {
    Node::new(NodeKind::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}
