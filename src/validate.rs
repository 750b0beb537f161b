//! Validation of tables before encoding.
//!
//! Encoding cannot fail for most structural mistakes (a count that overflows
//! its field, parallel arrays of different lengths) so tables are checked
//! up front and problems reported with their location.

use std::fmt;

use crate::types::Tag;

/// A type that can validate itself.
///
/// This is called once per table before encoding; implementations report
/// problems into the [`ValidationCtx`] and recurse into children where that
/// is meaningful.
pub trait Validate {
    fn validate_impl(&self, ctx: &mut ValidationCtx);
}

/// Validate a single table, producing a report if anything was wrong.
pub fn validate<T: Validate>(table: &T) -> Result<(), ValidationReport> {
    let mut ctx = ValidationCtx::new();
    table.validate_impl(&mut ctx);
    ctx.finish()
}

/// A context passed around during validation, accumulating located errors.
#[derive(Debug, Default)]
pub struct ValidationCtx {
    errors: Vec<ValidationError>,
    location: Vec<LocationElem>,
}

#[derive(Debug, Clone)]
enum LocationElem {
    Table(Tag),
    Field(&'static str),
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    location: Vec<LocationElem>,
    message: String,
}

/// All the errors encountered during a validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub(crate) errors: Vec<ValidationError>,
}

impl ValidationCtx {
    pub(crate) fn new() -> Self {
        ValidationCtx::default()
    }

    pub(crate) fn finish(self) -> Result<(), ValidationReport> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport {
                errors: self.errors,
            })
        }
    }

    /// Run `f` with the location pushed down into the named table.
    pub fn in_table(&mut self, tag: Tag, f: impl FnOnce(&mut ValidationCtx)) {
        self.location.push(LocationElem::Table(tag));
        f(self);
        self.location.pop();
    }

    /// Run `f` with the location pushed down into the named field.
    pub fn in_field(&mut self, name: &'static str, f: impl FnOnce(&mut ValidationCtx)) {
        self.location.push(LocationElem::Field(name));
        f(self);
        self.location.pop();
    }

    /// Record an error at the current location.
    pub fn report(&mut self, message: impl Into<String>) {
        self.errors.push(ValidationError {
            location: self.location.clone(),
            message: message.into(),
        });
    }

    /// Report unless `len` fits a u16 count field.
    pub fn check_count(&mut self, name: &'static str, len: usize) {
        if len > u16::MAX as usize {
            self.in_field(name, |ctx| {
                ctx.report(format!("array length {len} exceeds u16::MAX"))
            });
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "errors encountered during validation: {}", self.errors.len())?;
        for error in &self.errors {
            for (i, elem) in error.location.iter().enumerate() {
                if i > 0 {
                    f.write_str(": ")?;
                }
                match elem {
                    LocationElem::Table(tag) => write!(f, "table '{tag}'")?,
                    LocationElem::Field(name) => write!(f, "{name}")?,
                }
            }
            writeln!(f, ": {}", error.message)?;
        }
        Ok(())
    }
}

/// Declare table types with nothing of their own to check.
macro_rules! no_validation {
    ($($ty:ty),* $(,)?) => {
        $(impl $crate::validate::Validate for $ty {
            fn validate_impl(&self, _ctx: &mut $crate::validate::ValidationCtx) {}
        })*
    };
}

pub(crate) use no_validation;
