// Formula parser - converts formula strings into AST
// Supports: numbers, this-row structured references ([@Col], [@[Col Name]]),
// basic math (+, -, *, /), unary minus and parentheses.
// Inside a reference, ' escapes the next character: [@[Stock '[uds']]]

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// `[@Column]`: the named column of the row the formula lives in
    ThisRow(String),
    Neg(Box<Expr>),
    BinaryOp {
        op: Op,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

/// Parse a formula string (leading `=` required) into an AST.
pub fn parse(formula: &str) -> Result<Expr, String> {
    let formula = formula.trim();
    if !formula.starts_with('=') {
        return Err("Formula must start with =".to_string());
    }

    let tokens = tokenize(&formula[1..])?;
    if tokens.is_empty() {
        return Err("Empty formula".to_string());
    }

    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let expr = parser.parse_additive()?;
    if parser.pos < tokens.len() {
        return Err(format!("Unexpected token {:?}", tokens[parser.pos]));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    ThisRow(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => { chars.next(); }
            '+' => { tokens.push(Token::Plus); chars.next(); }
            '-' => { tokens.push(Token::Minus); chars.next(); }
            '*' => { tokens.push(Token::Star); chars.next(); }
            '/' => { tokens.push(Token::Slash); chars.next(); }
            '(' => { tokens.push(Token::LParen); chars.next(); }
            ')' => { tokens.push(Token::RParen); chars.next(); }
            '[' => {
                chars.next(); // consume '['
                if chars.next() != Some('@') {
                    return Err("Only this-row references ([@Column]) are supported".to_string());
                }
                let name = if chars.peek() == Some(&'[') {
                    // Bracketed column name: [@[Cantidad Pedida]]
                    chars.next();
                    let name = read_column_name(&mut chars)?;
                    if chars.next() != Some(']') {
                        return Err("Unterminated column reference".to_string());
                    }
                    name
                } else {
                    read_column_name(&mut chars)?
                };
                let name = name.trim();
                if name.is_empty() {
                    return Err("Empty column reference".to_string());
                }
                tokens.push(Token::ThisRow(name.to_string()));
            }
            '0'..='9' | '.' => {
                let mut num = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_digit() || ch == '.' {
                        num.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = num
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid number: {num}"))?;
                tokens.push(Token::Number(value));
            }
            _ => return Err(format!("Unexpected character: {c}")),
        }
    }

    Ok(tokens)
}

/// Column name up to the closing `]`, which is consumed. `'` escapes the next char.
fn read_column_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<String, String> {
    let mut name = String::new();
    loop {
        match chars.next() {
            Some(']') => return Ok(name),
            Some('\'') => match chars.next() {
                Some(ch) => name.push(ch),
                None => return Err("Unterminated column reference".to_string()),
            },
            Some(ch) => name.push(ch),
            None => return Err("Unterminated column reference".to_string()),
        }
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn parse_additive(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => Op::Add,
                Some(Token::Minus) => Op::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp { op, left: Box::new(left), right: Box::new(right) };
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => Op::Mul,
                Some(Token::Slash) => Op::Div,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::BinaryOp { op, left: Box::new(left), right: Box::new(right) };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.next().cloned() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::ThisRow(name)) => Ok(Expr::ThisRow(name)),
            Some(Token::LParen) => {
                let inner = self.parse_additive()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("Expected )".to_string()),
                }
            }
            Some(token) => Err(format!("Unexpected token {token:?}")),
            None => Err("Unexpected end of formula".to_string()),
        }
    }
}

/// Structured reference text for a column: `[@Name]`, or `[@[Name]]` when the
/// name contains characters that need the inner brackets. `[`, `]`, `#` and
/// `'` are escaped with `'`.
pub fn this_row_ref(column: &str) -> String {
    let plain = !column.is_empty()
        && column.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.');
    if plain {
        return format!("[@{column}]");
    }
    let mut escaped = String::with_capacity(column.len() + 2);
    for c in column.chars() {
        if matches!(c, '[' | ']' | '#' | '\'') {
            escaped.push('\'');
        }
        escaped.push(c);
    }
    format!("[@[{escaped}]]")
}

/// Column names referenced by an expression, in first-seen order.
pub fn referenced_columns(expr: &Expr) -> Vec<&str> {
    fn walk<'a>(expr: &'a Expr, out: &mut Vec<&'a str>) {
        match expr {
            Expr::Number(_) => {}
            Expr::ThisRow(name) => {
                if !out.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                    out.push(name);
                }
            }
            Expr::Neg(inner) => walk(inner, out),
            Expr::BinaryOp { left, right, .. } => {
                walk(left, out);
                walk(right, out);
            }
        }
    }

    let mut out = Vec::new();
    walk(expr, &mut out);
    out
}
