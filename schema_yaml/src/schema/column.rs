//! Column definitions

use crate::error::{Error, Result};
use crate::schema::options::{OptionValue, Options};

/// Represents a table column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    /// Logical type name, e.g. `integer`, `string`, `decimal`
    pub type_name: String,
    pub notnull: bool,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub unsigned: bool,
    pub fixed: bool,
    pub default: Option<OptionValue>,
    pub autoincrement: bool,
    pub comment: Option<String>,
    /// Options the column does not interpret itself
    pub custom_options: Options,
}

impl Column {
    /// Create a new NOT NULL column with the given name and logical type
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            notnull: true,
            length: None,
            precision: None,
            scale: None,
            unsigned: false,
            fixed: false,
            default: None,
            autoincrement: false,
            comment: None,
            custom_options: Options::new(),
        }
    }

    pub fn set_notnull(&mut self, notnull: bool) -> &mut Self {
        self.notnull = notnull;
        self
    }

    pub fn set_length(&mut self, length: Option<u32>) -> &mut Self {
        self.length = length;
        self
    }

    pub fn set_default(&mut self, default: Option<OptionValue>) -> &mut Self {
        self.default = default.filter(|value| !value.is_null());
        self
    }

    pub fn set_autoincrement(&mut self, autoincrement: bool) -> &mut Self {
        self.autoincrement = autoincrement;
        self
    }

    /// Builder-style variant of [`Column::set_notnull`]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.notnull = !nullable;
        self
    }

    /// Builder-style variant of [`Column::set_default`]
    pub fn with_default(mut self, default: impl Into<OptionValue>) -> Self {
        self.set_default(Some(default.into()));
        self
    }

    /// Apply an option bag to the column
    ///
    /// Recognised keys update the typed attributes; anything else is kept in
    /// `custom_options` untouched.
    pub fn set_options(&mut self, options: Options) -> Result<&mut Self> {
        for (key, value) in options {
            match key.as_str() {
                "length" => self.length = self.expect_u32(&key, &value)?,
                "precision" => self.precision = self.expect_u32(&key, &value)?,
                "scale" => self.scale = self.expect_u32(&key, &value)?,
                "unsigned" => self.unsigned = self.expect_bool(&key, &value)?,
                "fixed" => self.fixed = self.expect_bool(&key, &value)?,
                "notnull" => self.notnull = self.expect_bool(&key, &value)?,
                "autoincrement" => self.autoincrement = self.expect_bool(&key, &value)?,
                "default" => {
                    self.set_default(Some(value));
                }
                "comment" => {
                    self.comment = match value {
                        OptionValue::Null => None,
                        OptionValue::String(s) => Some(s),
                        other => return Err(self.invalid_option(&key, "string", &other)),
                    }
                }
                _ => {
                    self.custom_options.insert(key, value);
                }
            }
        }

        Ok(self)
    }

    fn expect_u32(&self, key: &str, value: &OptionValue) -> Result<Option<u32>> {
        if value.is_null() {
            return Ok(None);
        }
        value
            .as_u32()
            .map(Some)
            .ok_or_else(|| self.invalid_option(key, "non-negative int", value))
    }

    fn expect_bool(&self, key: &str, value: &OptionValue) -> Result<bool> {
        if value.is_null() {
            return Ok(false);
        }
        value
            .as_bool()
            .ok_or_else(|| self.invalid_option(key, "bool", value))
    }

    fn invalid_option(&self, key: &str, expected: &str, found: &OptionValue) -> Error {
        Error::SchemaError(format!(
            "Invalid value for option \"{}\" of column \"{}\": expected {}, found {}",
            key,
            self.name,
            expected,
            found.kind()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(yaml: &str) -> Options {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_new_column_is_not_null() {
        let column = Column::new("id", "integer");

        assert!(column.notnull);
        assert!(!column.autoincrement);
        assert_eq!(column.default, None);
    }

    #[test]
    fn test_set_options_maps_known_keys() {
        let mut column = Column::new("price", "decimal");
        column
            .set_options(options(
                "precision: 19\nscale: 4\ndefault: 0\nautoincrement: false\nunsigned: true\ncomment: Price\n",
            ))
            .unwrap();

        assert_eq!(column.precision, Some(19));
        assert_eq!(column.scale, Some(4));
        assert_eq!(column.default, Some(OptionValue::Integer(0)));
        assert!(column.unsigned);
        assert_eq!(column.comment.as_deref(), Some("Price"));
        assert!(column.custom_options.is_empty());
    }

    #[test]
    fn test_set_options_keeps_unknown_keys() {
        let mut column = Column::new("name", "string");
        column
            .set_options(options("length: 64\ncollation: utf8mb4_bin\n"))
            .unwrap();

        assert_eq!(column.length, Some(64));
        assert_eq!(
            column.custom_options.get("collation"),
            Some(&OptionValue::from("utf8mb4_bin"))
        );
    }

    #[test]
    fn test_set_options_rejects_wrong_shape() {
        let mut column = Column::new("name", "string");
        let err = column.set_options(options("length: long\n")).unwrap_err();

        assert!(matches!(err, Error::SchemaError(_)));
        assert!(err.to_string().contains("\"length\""));
    }

    #[test]
    fn test_null_default_is_unset() {
        let column = Column::new("data", "integer").with_default(OptionValue::Null);

        assert_eq!(column.default, None);
    }
}
