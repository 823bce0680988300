use std::fmt::{Display, Formatter};
use std::str::FromStr;
use sealed::sealed;
use thiserror::Error;

/// The place in a line based input where a value was read.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct TextLocation {
    /// Zero based line
    pub line: usize,
    /// Zero based field in the line
    pub position: usize,
}

impl TextLocation {
    pub const fn new(line: usize, position: usize) -> Self {
        Self { line, position }
    }
}

impl Display for TextLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.position)
    }
}

#[derive(Debug, Error)]
#[error(
    "{}Failed parsing of {parse_target:?}{}.\nCause: {source}",
    .tag.map(|v| format!("{v}: ")).unwrap_or_default(),
    .location.map(|v| format!(" at {v}")).unwrap_or_default()
)]
pub struct ParseErrorEx<E> {
    parse_target: String,
    tag: Option<&'static str>,
    location: Option<TextLocation>,
    #[source]
    source: E
}

impl<E> ParseErrorEx<E> {
    pub fn new(parse_target: String, tag: Option<&'static str>, location: Option<TextLocation>, source: E) -> Self {
        Self { parse_target, tag, location, source }
    }

    pub fn parse_target(&self) -> &str {
        &self.parse_target
    }

    pub fn tag(&self) -> Option<&'static str> {
        self.tag
    }

    pub fn location(&self) -> Option<TextLocation> {
        self.location
    }
}

pub trait FromStrEx: FromStr {
    fn from_str_ex(s: &str) -> Result<Self, ParseErrorEx<<Self as FromStr>::Err>>;
    fn from_str_ex_at(s: &str, tag: &'static str, location: TextLocation) -> Result<Self, ParseErrorEx<<Self as FromStr>::Err>>;
}

impl<T> FromStrEx for T where T: FromStr {
    fn from_str_ex(s: &str) -> Result<Self, ParseErrorEx<<Self as FromStr>::Err>> {
        <Self as FromStr>::from_str(s).map_err(|e| {
            ParseErrorEx::new(s.to_string(), None, None, e)
        })
    }

    fn from_str_ex_at(s: &str, tag: &'static str, location: TextLocation) -> Result<Self, ParseErrorEx<<Self as FromStr>::Err>> {
        <Self as FromStr>::from_str(s).map_err(|e| {
            ParseErrorEx::new(s.to_string(), Some(tag), Some(location), e)
        })
    }
}

/// Parsing that remembers what was parsed, and where.
#[sealed]
pub trait ParseEx {
    fn parse_ex<F: FromStr>(&self) -> Result<F, ParseErrorEx<F::Err>>;
    fn parse_ex_at<F: FromStr>(&self, tag: &'static str, location: TextLocation) -> Result<F, ParseErrorEx<F::Err>>;
}

#[sealed]
impl ParseEx for str {
    fn parse_ex<F: FromStr>(&self) -> Result<F, ParseErrorEx<F::Err>> {
        F::from_str_ex(self.trim())
    }

    fn parse_ex_at<F: FromStr>(&self, tag: &'static str, location: TextLocation) -> Result<F, ParseErrorEx<F::Err>> {
        F::from_str_ex_at(self.trim(), tag, location)
    }
}

#[cfg(test)]
mod test {
    use crate::from_str_ex::{ParseEx, TextLocation};

    #[test]
    fn parses_trimmed_values(){
        let value: usize = " 42 ".parse_ex().unwrap();
        assert_eq!(42, value);
    }

    #[test]
    fn error_knows_where_it_happened(){
        let err = "x1".parse_ex_at::<usize>("topic", TextLocation::new(3, 7)).unwrap_err();
        assert_eq!("x1", err.parse_target());
        assert_eq!(Some("topic"), err.tag());
        assert_eq!(Some(TextLocation::new(3, 7)), err.location());
        let message = err.to_string();
        assert!(message.starts_with("topic: Failed parsing of \"x1\" at 3:7."), "{message}");
    }
}
