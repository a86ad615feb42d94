use crate::error::EvalError;

/// A lexical token of the expression language.
///
/// The lexer recognises more than the evaluator accepts (strings, brackets,
/// comparison operators, ...) so that those forms reach the lowering pass and
/// are rejected there as unsupported rather than as noise.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Imaginary,
    Str(String),
    Name(String),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    At,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,
    Assign,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,
    Walrus,
    Eof,
}

/// Split `source` into tokens, terminated by [`Token::Eof`].
///
/// # Errors
///
/// Returns [`EvalError::InvalidSyntax`] for characters outside the language,
/// malformed numeric literals and unterminated strings.
pub fn tokenize(source: &str) -> Result<Vec<Token>, EvalError> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        pos: 0,
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token == Token::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Consume `next` if it is the upcoming character.
    fn eat(&mut self, next: char) -> bool {
        if self.peek() == Some(next) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn next_token(&mut self) -> Result<Token, EvalError> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }

        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        let fraction = c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit());
        if c.is_ascii_digit() || fraction {
            return self.number();
        }
        if c == '_' || c.is_alphabetic() {
            return Ok(self.name());
        }
        if c == '\'' || c == '"' {
            return self.string(c);
        }

        self.pos += 1;
        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if self.eat('*') => Token::DoubleStar,
            '*' => Token::Star,
            '/' if self.eat('/') => Token::DoubleSlash,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '@' => Token::At,
            '&' => Token::Amp,
            '|' => Token::Pipe,
            '^' => Token::Caret,
            '~' => Token::Tilde,
            '<' if self.eat('<') => Token::Shl,
            '<' if self.eat('=') => Token::Le,
            '<' => Token::Lt,
            '>' if self.eat('>') => Token::Shr,
            '>' if self.eat('=') => Token::Ge,
            '>' => Token::Gt,
            '=' if self.eat('=') => Token::EqEq,
            '=' => Token::Assign,
            '!' if self.eat('=') => Token::NotEq,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ',' => Token::Comma,
            '.' => Token::Dot,
            ':' if self.eat('=') => Token::Walrus,
            ':' => Token::Colon,
            _ => return Err(EvalError::InvalidSyntax),
        };
        Ok(token)
    }

    fn name(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|c| c == '_' || c.is_alphanumeric()) {
            self.pos += 1;
        }
        Token::Name(self.chars[start..self.pos].iter().collect())
    }

    fn string(&mut self, quote: char) -> Result<Token, EvalError> {
        self.pos += 1;
        let mut text = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(EvalError::InvalidSyntax),
                Some('\\') => {
                    let escaped = self.bump().ok_or(EvalError::InvalidSyntax)?;
                    text.push(escaped);
                }
                Some(c) if c == quote => return Ok(Token::Str(text)),
                Some(c) => text.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<Token, EvalError> {
        if self.peek() == Some('0') {
            let radix = match self.peek_at(1) {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.pos += 2;
                return self.radix_integer(radix);
            }
        }

        let mut literal = self.digits(10)?;
        let mut is_float = false;

        if self.peek() == Some('.') {
            self.pos += 1;
            literal.push('.');
            is_float = true;
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                literal.push_str(&self.digits(10)?);
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = self.peek_at(1).filter(|c| *c == '+' || *c == '-');
            let first = self.peek_at(if sign.is_some() { 2 } else { 1 });
            if first.is_some_and(|c| c.is_ascii_digit()) {
                self.pos += if sign.is_some() { 2 } else { 1 };
                literal.push('e');
                if let Some(sign) = sign {
                    literal.push(sign);
                }
                literal.push_str(&self.digits(10)?);
                is_float = true;
            }
        }

        if matches!(self.peek(), Some('j' | 'J')) {
            self.pos += 1;
            self.reject_trailing_name()?;
            return Ok(Token::Imaginary);
        }
        self.reject_trailing_name()?;

        // Python rejects `007` but accepts `0`, `00` and `0.7`.
        let leading_zero = literal.len() > 1 && literal.starts_with('0');
        if !is_float && leading_zero && literal.chars().any(|c| c != '0') {
            return Err(EvalError::InvalidSyntax);
        }

        literal
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| EvalError::InvalidSyntax)
    }

    fn radix_integer(&mut self, radix: u32) -> Result<Token, EvalError> {
        // A single leading underscore is allowed after the prefix: `0x_ff`.
        self.eat('_');
        let digits = self.digits(radix)?;
        self.reject_trailing_name()?;
        if digits.is_empty() {
            return Err(EvalError::InvalidSyntax);
        }
        let value = digits
            .chars()
            .filter_map(|c| c.to_digit(radix))
            .fold(0.0_f64, |acc, d| acc * f64::from(radix) + f64::from(d));
        Ok(Token::Number(value))
    }

    /// Read a run of digits in `radix`, allowing single underscores between
    /// digits. The underscores are stripped from the returned text.
    fn digits(&mut self, radix: u32) -> Result<String, EvalError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_digit(radix) {
                out.push(c);
                self.pos += 1;
            } else if c == '_'
                && !out.is_empty()
                && self.peek_at(1).is_some_and(|n| n.is_digit(radix))
            {
                self.pos += 1;
            } else if c == '_' {
                return Err(EvalError::InvalidSyntax);
            } else {
                break;
            }
        }
        Ok(out)
    }

    /// `2x` or `1.5e` are not valid literals.
    fn reject_trailing_name(&self) -> Result<(), EvalError> {
        if self.peek().is_some_and(|c| c == '_' || c.is_alphanumeric()) {
            Err(EvalError::InvalidSyntax)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        tokenize(source).unwrap()
    }

    #[test]
    fn arithmetic_tokens() {
        assert_eq!(
            lex("2 ** -x // 3"),
            vec![
                Token::Number(2.0),
                Token::DoubleStar,
                Token::Minus,
                Token::Name("x".to_string()),
                Token::DoubleSlash,
                Token::Number(3.0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(lex("1.5")[0], Token::Number(1.5));
        assert_eq!(lex(".5")[0], Token::Number(0.5));
        assert_eq!(lex("5.")[0], Token::Number(5.0));
        assert_eq!(lex("1e3")[0], Token::Number(1000.0));
        assert_eq!(lex("2.5E-1")[0], Token::Number(0.25));
        assert_eq!(lex("1_000")[0], Token::Number(1000.0));
        assert_eq!(lex("0x1f")[0], Token::Number(31.0));
        assert_eq!(lex("0b101")[0], Token::Number(5.0));
        assert_eq!(lex("0o17")[0], Token::Number(15.0));
        assert_eq!(lex("00")[0], Token::Number(0.0));
        assert_eq!(lex("3j")[0], Token::Imaginary);
    }

    #[test]
    fn exponent_without_digits_is_not_consumed() {
        // `1e` is a malformed literal, not `1` followed by the name `e`.
        assert_eq!(tokenize("1e"), Err(EvalError::InvalidSyntax));
    }

    #[test]
    fn malformed_literals() {
        assert_eq!(tokenize("2x"), Err(EvalError::InvalidSyntax));
        assert_eq!(tokenize("007"), Err(EvalError::InvalidSyntax));
        assert_eq!(tokenize("1__0"), Err(EvalError::InvalidSyntax));
        assert_eq!(tokenize("1_"), Err(EvalError::InvalidSyntax));
        assert_eq!(tokenize("0x"), Err(EvalError::InvalidSyntax));
    }

    #[test]
    fn strings() {
        assert_eq!(
            lex(r#"'os' "a\"b""#),
            vec![
                Token::Str("os".to_string()),
                Token::Str("a\"b".to_string()),
                Token::Eof,
            ]
        );
        assert_eq!(tokenize("'open"), Err(EvalError::InvalidSyntax));
    }

    #[test]
    fn unknown_characters() {
        assert_eq!(tokenize("1 $ 2"), Err(EvalError::InvalidSyntax));
        assert_eq!(tokenize("1; 2"), Err(EvalError::InvalidSyntax));
        assert_eq!(tokenize("!x"), Err(EvalError::InvalidSyntax));
    }

    #[test]
    fn walrus_is_one_token() {
        assert_eq!(
            lex("(x := 1)")[1..4],
            [
                Token::Name("x".to_string()),
                Token::Walrus,
                Token::Number(1.0),
            ]
        );
        assert_eq!(lex("x[1:2]")[3], Token::Colon);
    }

    #[test]
    fn empty_input_is_just_eof() {
        assert_eq!(lex("   "), vec![Token::Eof]);
    }
}
