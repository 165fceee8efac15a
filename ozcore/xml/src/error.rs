use std::fmt;

#[derive(Debug, Clone)]
pub enum XmlError {
    Syntax(String),
    Write(String),
    EmptyDocument,
    UnexpectedEof(String),
    TextOutsideRoot,
    InvalidName(String),
    AttrParse(String),
    MissingAttr(String),
    AttrList(Vec<XmlError>),
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlError::Syntax(s) => write!(f, "XML syntax error: {s}"),
            XmlError::Write(s) => write!(f, "XML write error: {s}"),
            XmlError::EmptyDocument => write!(f, "Document has no top-level element"),
            XmlError::UnexpectedEof(tag) => {
                write!(f, "Unexpected end of document inside <{tag}>")
            }
            XmlError::TextOutsideRoot => write!(f, "Text found outside the root element"),
            XmlError::InvalidName(s) => write!(f, "Invalid element or attribute name: '{s}'"),
            XmlError::AttrParse(s) => write!(f, "Attribute parsing failed: {s}"),
            XmlError::MissingAttr(s) => write!(f, "Missing required attribute: {s}"),
            XmlError::AttrList(list) => write!(f, "Multiple attribute parsing errors: {list:?}"),
        }
    }
}

impl std::error::Error for XmlError {}

impl From<quick_xml::Error> for XmlError {
    fn from(err: quick_xml::Error) -> Self {
        XmlError::Syntax(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for XmlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        XmlError::Syntax(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, XmlError>;
