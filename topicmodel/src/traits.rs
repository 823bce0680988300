/// Allows to returns a string that can be used by [std::str::FromStr]
pub trait AsParseableString {
    fn as_parseable_string(&self) -> String;
}

impl AsParseableString for String {
    fn as_parseable_string(&self) -> String {
        self.clone()
    }
}

impl AsParseableString for str {
    fn as_parseable_string(&self) -> String {
        self.to_string()
    }
}
