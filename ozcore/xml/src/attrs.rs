use crate::error::{Result, XmlError};
use crate::node::{Attrs, Node};

pub struct AttrParser<'a> {
    pub attrs: &'a Attrs,
    pub errors: Vec<XmlError>,
}

impl<'a> AttrParser<'a> {
    pub fn new(node: &'a Node) -> Self {
        Self {
            attrs: &node.attrs,
            errors: Vec::new(),
        }
    }

    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(&self) -> Result<()> {
        if self.ok() {
            Ok(())
        } else {
            Err(XmlError::AttrList(self.errors.clone()))
        }
    }

    fn get_raw(&mut self, key: &str, require: bool) -> Option<&'a str> {
        let val = self.attrs.get(key);
        if require && val.is_none() {
            self.errors.push(XmlError::AttrParse(format!(
                "Required attribute '{key}' not found"
            )));
        }
        val
    }

    pub fn optional_string(&mut self, key: &str) -> Option<&'a str> {
        self.get_raw(key, false)
    }

    /// Get a required string attribute, returning an error if missing.
    pub fn required_string(&mut self, key: &str) -> Result<&'a str> {
        self.optional_string(key)
            .ok_or_else(|| XmlError::MissingAttr(key.to_string()))
    }

    pub fn optional_u64(&mut self, key: &str) -> Option<u64> {
        self.get_raw(key, false)
            .and_then(|s| match s.parse::<u64>() {
                Ok(val) => Some(val),
                Err(e) => {
                    self.errors.push(XmlError::AttrParse(format!(
                        "Failed to parse u64 from '{s}' for key '{key}': {e}"
                    )));
                    None
                }
            })
    }

    fn get_bool(&mut self, key: &str, require: bool) -> Option<bool> {
        self.get_raw(key, require).and_then(|s| match s.parse::<bool>() {
            Ok(val) => Some(val),
            Err(e) => {
                self.errors.push(XmlError::AttrParse(format!(
                    "Failed to parse bool from '{s}' for key '{key}': {e}"
                )));
                None
            }
        })
    }

    pub fn optional_bool(&mut self, key: &str) -> bool {
        self.get_bool(key, false).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::NodeBuilder;
    use crate::error::XmlError;

    #[test]
    fn errors_accumulate_until_finish() {
        let node = NodeBuilder::new("ask")
            .attr("timeout", "soon")
            .attr("bargein", "true")
            .build();
        let mut parser = node.attrs();

        assert_eq!(parser.optional_u64("timeout"), None);
        assert!(parser.optional_bool("bargein"));
        assert!(matches!(
            parser.required_string("voice"),
            Err(XmlError::MissingAttr(key)) if key == "voice"
        ));
        assert!(!parser.ok());
        assert!(matches!(parser.finish(), Err(XmlError::AttrList(list)) if list.len() == 1));
    }
}
