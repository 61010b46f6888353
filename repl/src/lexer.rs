use logos::Logos;

#[derive(Debug, Logos, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n\f]+")] // Skip whitespace
#[logos(skip r"#.*")] // Skip comments
pub enum Token {
    // Statements
    #[token("slot")]
    Slot,
    #[token("set")]
    Set,
    #[token("get")]
    Get,
    #[token("mirror")]
    Mirror,

    // Literals
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[regex("0x[0-9a-fA-F]+", |lex| u64::from_str_radix(&lex.slice()[2..], 16).ok())]
    Bits(u64),
    #[regex("-?[0-9]+", |lex| lex.slice().parse().ok())]
    Integer(i64),
    #[regex(r"-?[0-9]+\.[0-9]+([eE]-?[0-9]+)?", |lex| lex.slice().parse().ok())]
    Float(f64),

    /// Slot names, shorty characters and type space names
    #[regex("[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut lexer = Token::lexer(input);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => tokens.push(token),
            Err(()) => return Err(format!("Invalid token {:?}", lexer.slice())),
        }
    }
    Ok(tokens)
}
